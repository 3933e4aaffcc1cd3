//! Shared test doubles and model builders for domain-layer tests.

use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::gateway::catalog::{Playback, RemoteCatalog, RemoteRecording};
use crate::notification::Notifier;
use async_trait::async_trait;
use entity::callback_kind::CallbackKind;
use entity::{activities, callback_events, recordings, Id};
use sea_orm::DatabaseConnection;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Catalog double that serves canned recordings and records every call it
/// receives, in order.
pub(crate) struct StubCatalog {
    recordings: HashMap<String, RemoteRecording>,
    calls: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub(crate) fn with_recordings(recordings: Vec<RemoteRecording>) -> Self {
        StubCatalog {
            recordings: recordings
                .into_iter()
                .map(|r| (r.record_id.clone(), r))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteCatalog for StubCatalog {
    async fn fetch_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, RemoteRecording>, Error> {
        self.record(format!("fetch_by_ids {}", ids.join(",")));
        Ok(ids
            .iter()
            .filter_map(|id| self.recordings.get(id).cloned())
            .map(|r| (r.record_id.clone(), r))
            .collect())
    }

    async fn publish(&self, recording_id: &str, publish: bool) -> Result<String, Error> {
        self.record(format!("publish {recording_id} {publish}"));
        Ok("ok".to_string())
    }

    async fn update(
        &self,
        recording_id: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, Error> {
        let fields = serde_json::Value::Object(fields.clone());
        self.record(format!("update {recording_id} {fields}"));
        Ok("ok".to_string())
    }

    async fn delete(&self, recording_id: &str) -> Result<String, Error> {
        self.record(format!("delete {recording_id}"));
        Ok("ok".to_string())
    }
}

/// Notifier double counting recording-ready sends and completion enqueues.
#[derive(Default)]
pub(crate) struct CountingNotifier {
    recording_ready_sends: Mutex<usize>,
    completion_enqueues: Mutex<Vec<String>>,
    fail: bool,
}

impl CountingNotifier {
    pub(crate) fn failing() -> Self {
        CountingNotifier {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn recording_ready_sends(&self) -> usize {
        *self.recording_ready_sends.lock().unwrap()
    }

    pub(crate) fn completion_enqueues(&self) -> Vec<String> {
        self.completion_enqueues.lock().unwrap().clone()
    }

    fn downstream_failure(&self) -> Error {
        Error::from_kind(DomainErrorKind::Internal(InternalErrorKind::Other(
            "notification sink is down".to_string(),
        )))
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn recording_ready(
        &self,
        _db: &DatabaseConnection,
        _activity: &activities::Model,
    ) -> Result<(), Error> {
        if self.fail {
            return Err(self.downstream_failure());
        }
        *self.recording_ready_sends.lock().unwrap() += 1;
        Ok(())
    }

    async fn enqueue_completion(
        &self,
        _db: &DatabaseConnection,
        _activity: &activities::Model,
        user_id: &str,
    ) -> Result<(), Error> {
        if self.fail {
            return Err(self.downstream_failure());
        }
        self.completion_enqueues
            .lock()
            .unwrap()
            .push(user_id.to_string());
        Ok(())
    }
}

pub(crate) fn remote_recording(
    record_id: &str,
    meeting_id: &str,
    start_time: i64,
) -> RemoteRecording {
    let mut playbacks = BTreeMap::new();
    playbacks.insert(
        "presentation".to_string(),
        Playback {
            url: format!("https://conf.example.com/playback/{record_id}"),
            length_seconds: Some(3600),
            preview: Vec::new(),
        },
    );

    RemoteRecording {
        record_id: record_id.to_string(),
        meeting_id: meeting_id.to_string(),
        meeting_name: "Weekly lecture".to_string(),
        published: true,
        start_time,
        end_time: start_time + 3_600_000,
        protected: Some(false),
        playbacks,
        metadata: BTreeMap::new(),
    }
}

pub(crate) fn local_recording(recording_id: &str, course_id: i64, imported: bool) -> recordings::Model {
    let now = chrono::Utc::now();
    recordings::Model {
        id: Id::new_v4(),
        recording_id: recording_id.to_string(),
        activity_id: Id::new_v4(),
        course_id,
        imported,
        headless: false,
        payload: serde_json::json!({}),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn activity_model(meeting_id: &str) -> activities::Model {
    let now = chrono::Utc::now();
    activities::Model {
        id: Id::new_v4(),
        course_id: 5,
        meeting_id: meeting_id.to_string(),
        name: "Weekly lecture".to_string(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn callback_event_model(correlation_id: &str, kind: CallbackKind) -> callback_events::Model {
    let now = chrono::Utc::now();
    callback_events::Model {
        id: Id::new_v4(),
        correlation_id: correlation_id.to_string(),
        kind,
        payload: serde_json::json!({}),
        created_at: now.into(),
    }
}
