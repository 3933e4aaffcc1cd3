use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of inbound callback an event-log row was recorded for.
#[derive(
    Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "callback_kind")]
pub enum CallbackKind {
    /// The remote server reports a recording finished processing
    #[sea_orm(string_value = "recording_ready")]
    #[default]
    RecordingReady,
    /// The remote server reports meeting lifecycle events and attendance
    #[sea_orm(string_value = "meeting_events")]
    MeetingEvents,
}

impl std::fmt::Display for CallbackKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackKind::RecordingReady => write!(fmt, "recording_ready"),
            CallbackKind::MeetingEvents => write!(fmt, "meeting_events"),
        }
    }
}
