//! Remote recording-catalog client.
//!
//! The conferencing server owns the authoritative recording catalog; this
//! module provides the RPC surface against it (fetch by ids, publish,
//! update, delete) plus the parsing of its native payload representation
//! into [`RemoteRecording`] values.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service::config::Config;
use std::collections::{BTreeMap, HashMap};

/// A recording as the remote catalog describes it, normalized from the
/// catalog's native payload representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecording {
    pub record_id: String,
    pub meeting_id: String,
    pub meeting_name: String,
    pub published: bool,
    /// Milliseconds since the epoch, as reported by the catalog
    pub start_time: i64,
    pub end_time: i64,
    pub protected: Option<bool>,
    /// Playback formats keyed by their type name
    pub playbacks: BTreeMap<String, Playback>,
    /// Metadata entries, keys namespaced with the `meta_` prefix
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playback {
    pub url: String,
    pub length_seconds: Option<i64>,
    pub preview: Vec<PreviewImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewImage {
    pub url: String,
    pub attributes: BTreeMap<String, String>,
}

/// RPC operations against the remote catalog. The trait is the seam the
/// reconciler and dispatcher are written against so tests can substitute a
/// recording double.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetches the catalog entries for exactly the given recording ids,
    /// indexed by recording id. Ids unknown to the catalog are absent from
    /// the result.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<HashMap<String, RemoteRecording>, Error>;

    /// Sets the published flag of a recording; returns the catalog's status string.
    async fn publish(&self, recording_id: &str, publish: bool) -> Result<String, Error>;

    /// Updates catalog-side fields of a recording; returns the catalog's status string.
    async fn update(
        &self,
        recording_id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<String, Error>;

    /// Deletes a recording from the catalog; returns the catalog's status string.
    async fn delete(&self, recording_id: &str) -> Result<String, Error>;
}

/// Coerces a metadata value to its string form. Structured (non-scalar)
/// values collapse to the empty string; the catalog occasionally nests
/// junk into metadata and this information loss is part of the contract.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) | Value::Array(_) => String::new(),
    }
}

fn invalid_payload(reason: &str) -> Error {
    Error::from_kind(DomainErrorKind::External(ExternalErrorKind::Other(
        format!("Invalid catalog payload: {reason}"),
    )))
}

/// Parses one catalog entry from its native representation.
///
/// Playback formats are keyed by their type name; each format's optional
/// preview block expands to an ordered image sequence carrying inline
/// attributes and trimmed URL text. Metadata keys gain the `meta_` prefix
/// and non-scalar values are coerced to "".
pub fn parse_remote_recording(value: &Value) -> Result<RemoteRecording, Error> {
    let record_id = value
        .get("record_id")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_payload("missing record_id"))?
        .to_string();
    let meeting_id = value
        .get("meeting_id")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_payload("missing meeting_id"))?
        .to_string();

    let mut playbacks = BTreeMap::new();
    if let Some(formats) = value.pointer("/playback/format") {
        // A single format may arrive as a bare object rather than a list.
        let formats: Vec<&Value> = match formats {
            Value::Array(list) => list.iter().collect(),
            other => vec![other],
        };
        for format in formats {
            let kind = format
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid_payload("playback format without type"))?
                .to_string();
            playbacks.insert(kind, parse_playback(format));
        }
    }

    let mut metadata = BTreeMap::new();
    if let Some(Value::Object(entries)) = value.get("metadata") {
        for (key, entry) in entries {
            metadata.insert(format!("meta_{key}"), scalar_to_string(entry));
        }
    }

    Ok(RemoteRecording {
        record_id,
        meeting_id,
        meeting_name: value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        published: value
            .get("published")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        start_time: value
            .get("start_time")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        end_time: value.get("end_time").and_then(Value::as_i64).unwrap_or(0),
        protected: value.get("protected").and_then(Value::as_bool),
        playbacks,
        metadata,
    })
}

fn parse_playback(format: &Value) -> Playback {
    let mut preview = Vec::new();
    if let Some(Value::Array(images)) = format.pointer("/preview/images") {
        for image in images {
            let mut attributes = BTreeMap::new();
            if let Some(Value::Object(entries)) = image.get("attributes") {
                for (key, entry) in entries {
                    attributes.insert(key.clone(), scalar_to_string(entry));
                }
            }
            preview.push(PreviewImage {
                url: image
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                attributes,
            });
        }
    }

    Playback {
        url: format
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        length_seconds: format.get("length").and_then(Value::as_i64),
        preview,
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RecordingsResponse {
    #[serde(default)]
    recordings: Vec<Value>,
}

/// HTTP implementation of [`RemoteCatalog`] against the conferencing
/// server's recording API.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// Create a new catalog client with the given base URL and shared secret
    pub fn new(base_url: &str, shared_secret: &str) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", shared_secret);
        let mut header_value =
            reqwest::header::HeaderValue::from_str(&auth_value).map_err(|e| {
                warn!("Failed to create auth header: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                        "Invalid shared secret format".to_string(),
                    )),
                }
            })?;
        header_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let shared_secret = config.shared_secret().ok_or_else(|| {
            warn!("Failed to get conferencing shared secret from config");
            Error::from_kind(DomainErrorKind::Internal(InternalErrorKind::Config))
        })?;

        Self::new(&config.catalog_base_url(), &shared_secret)
    }

    async fn read_status(&self, response: reqwest::Response) -> Result<String, Error> {
        if response.status().is_success() {
            let status: StatusResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse catalog status response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from the recording catalog".to_string(),
                    )),
                }
            })?;
            Ok(status.status)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Recording catalog API error: {}", error_text);
            Err(Error::from_kind(DomainErrorKind::External(
                ExternalErrorKind::Other(error_text),
            )))
        }
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<HashMap<String, RemoteRecording>, Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/api/v1/recordings", self.base_url);

        debug!("Fetching {} recording(s) from the catalog", ids.len());

        let response = self
            .client
            .get(&url)
            .query(&[("record_id", ids.join(","))])
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch recordings from the catalog: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Recording catalog API error: {}", error_text);
            return Err(Error::from_kind(DomainErrorKind::External(
                ExternalErrorKind::Other(error_text),
            )));
        }

        let body: RecordingsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse catalog recordings response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from the recording catalog".to_string(),
                )),
            }
        })?;

        let mut recordings = HashMap::new();
        for entry in &body.recordings {
            let recording = parse_remote_recording(entry)?;
            recordings.insert(recording.record_id.clone(), recording);
        }

        Ok(recordings)
    }

    async fn publish(&self, recording_id: &str, publish: bool) -> Result<String, Error> {
        let url = format!("{}/api/v1/recordings/{}/publish", self.base_url, recording_id);

        debug!("Setting published={publish} for recording: {recording_id}");

        let response = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "publish": publish }))
            .send()
            .await?;

        self.read_status(response).await
    }

    async fn update(
        &self,
        recording_id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<String, Error> {
        let url = format!("{}/api/v1/recordings/{}", self.base_url, recording_id);

        debug!("Updating recording: {recording_id}");

        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "meta": fields }))
            .send()
            .await?;

        self.read_status(response).await
    }

    async fn delete(&self, recording_id: &str) -> Result<String, Error> {
        let url = format!("{}/api/v1/recordings/{}", self.base_url, recording_id);

        debug!("Deleting recording from the catalog: {recording_id}");

        let response = self.client.delete(&url).send().await?;

        self.read_status(response).await
    }
}
