//! Claims and body schemas for the remote server's callbacks.
//!
//! Bodies decode into validated structs; an absent or mis-typed field is a
//! decode failure reported as a bad request, never a partially-processed
//! event.

use serde::{Deserialize, Serialize};

/// Claims of the HS256-signed recording-ready token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingReadyClaims {
    /// External meeting identifier, possibly suffixed with a `-...`
    /// qualifier and a `[n]` breakout index
    pub meeting_id: String,
    /// Absent on callbacks from older remote server versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// JSON body of a meeting-events delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingEventsBody {
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub attributes: EventAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttributes {
    pub meeting: MeetingAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingAttributes {
    #[serde(rename = "external-meeting-id")]
    pub external_meeting_id: String,
    #[serde(rename = "internal-meeting-id")]
    pub internal_meeting_id: String,
    #[serde(default)]
    pub users: Vec<Attendee>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(rename = "external-user-id")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
