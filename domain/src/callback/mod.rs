//! Processing of asynchronous callbacks from the remote conferencing server.
//!
//! Both callback kinds arrive as signed HTTP notifications and are handled
//! statelessly: verify the signature, match the delivery against a live
//! activity, enforce at-most-once processing through the callback event log,
//! and hand real work off to the notification sink.
//!
//! The idempotence guard is advisory: the event-log count check and the
//! append are separate statements, so two concurrent duplicate deliveries
//! can both pass the check. The remote server delivers duplicates rarely and
//! retries on 5xx only, which is why the source system shipped the same way.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::notification::Notifier;
use crate::signature::{self, SignatureAlgorithm};
use entity::activities;
use entity::callback_kind::CallbackKind;
use log::*;
use sea_orm::DatabaseConnection;

pub mod claims;

use claims::{MeetingEventsBody, RecordingReadyClaims};

/// Terminal outcome of a successfully handled callback. The web layer maps
/// these onto the status codes the remote server's retry logic expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Recording-ready delivery acknowledged (first or repeated)
    Accepted,
    /// Meeting-events delivery processed for the first time
    Enqueued,
    /// Meeting-events delivery seen before; no attendee processing happened
    AlreadyProcessed,
}

/// Derives the activity-facing meeting identifier from a callback meeting
/// id: the substring before a literal `[`, then the prefix before a literal
/// `-`. Breakout rooms and qualifier suffixes share the parent's prefix.
pub fn meeting_id_prefix(meeting_id: &str) -> &str {
    let before_bracket = meeting_id.split('[').next().unwrap_or_default();
    before_bracket.split('-').next().unwrap_or_default()
}

fn verification_failure(reason: impl Into<String>) -> Error {
    Error::from_kind(DomainErrorKind::Verification(reason.into()))
}

fn stale() -> Error {
    Error::from_kind(DomainErrorKind::Stale)
}

/// Wraps a downstream failure into the one retryable-by-remote error kind.
fn unavailable(err: Error) -> Error {
    let reason = err.to_string();
    Error {
        source: Some(Box::new(err)),
        error_kind: DomainErrorKind::External(ExternalErrorKind::Unavailable(reason)),
    }
}

/// Handles a recording-ready callback.
///
/// The signed token is verified with HS256 against the shared secret. The
/// notification is sent at most once per record id across retried
/// deliveries, but every delivery appends to the event log. Downstream
/// failures surface as `Unavailable` so the remote server re-delivers.
pub async fn recording_ready(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    activity: Option<&activities::Model>,
    shared_secret: &str,
    signed_params: &str,
) -> Result<CallbackOutcome, Error> {
    let claims: RecordingReadyClaims =
        signature::verify(signed_params, shared_secret, SignatureAlgorithm::HS256)?;

    let prefix = meeting_id_prefix(&claims.meeting_id);
    let activity = match activity {
        Some(activity) if activity.meeting_id == prefix => activity,
        _ => {
            warn!(
                "recording_ready callback for unknown or deleted activity: {}",
                claims.meeting_id
            );
            return Err(stale());
        }
    };

    match &claims.record_id {
        None => {
            // Older remote servers send no record id; there is nothing to
            // correlate retries on, so notify unconditionally.
            debug!(
                "recording_ready callback without record_id for meeting: {}",
                claims.meeting_id
            );
            notifier
                .recording_ready(db, activity)
                .await
                .map_err(unavailable)?;
            Ok(CallbackOutcome::Accepted)
        }
        Some(record_id) => {
            let result: Result<(), Error> = async {
                let count = entity_api::callback_event::count_by_correlation(
                    db,
                    record_id,
                    CallbackKind::RecordingReady,
                )
                .await?;

                if count == 0 {
                    notifier.recording_ready(db, activity).await?;
                } else {
                    debug!("recording_ready already notified for record: {record_id}");
                }

                // Every delivery is logged, repeats included.
                entity_api::callback_event::create(
                    db,
                    record_id,
                    CallbackKind::RecordingReady,
                    serde_json::json!({
                        "meeting_id": claims.meeting_id,
                        "record_id": record_id,
                    }),
                )
                .await?;

                Ok(())
            }
            .await;

            result.map_err(unavailable)?;
            Ok(CallbackOutcome::Accepted)
        }
    }
}

/// Handles a meeting-events callback.
///
/// The bearer token is verified with HS512; the JSON body must decode into
/// the meeting-events schema. The event-log append happens before the
/// idempotence check: the append itself is the count signal, so a count of
/// exactly one marks the first delivery.
pub async fn meeting_events(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    activity: Option<&activities::Model>,
    shared_secret: &str,
    authorization: Option<&str>,
    body: &str,
) -> Result<CallbackOutcome, Error> {
    let bearer = authorization
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| verification_failure("missing authorization bearer token"))?;

    // The token carries no claims of interest; only the signature matters.
    signature::verify::<serde_json::Value>(bearer, shared_secret, SignatureAlgorithm::HS512)?;

    let raw: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| verification_failure(format!("malformed meeting-events body: {e}")))?;
    let events: MeetingEventsBody = serde_json::from_value(raw.clone())
        .map_err(|e| verification_failure(format!("malformed meeting-events body: {e}")))?;

    let meeting = &events.data.attributes.meeting;
    let prefix = meeting_id_prefix(&meeting.external_meeting_id);
    let activity = match activity {
        Some(activity) if activity.meeting_id == prefix => activity,
        _ => {
            warn!(
                "meeting_events callback for unknown or deleted activity: {}",
                meeting.external_meeting_id
            );
            return Err(stale());
        }
    };

    entity_api::callback_event::create(
        db,
        &meeting.internal_meeting_id,
        CallbackKind::MeetingEvents,
        raw,
    )
    .await?;

    let count = entity_api::callback_event::count_by_correlation(
        db,
        &meeting.internal_meeting_id,
        CallbackKind::MeetingEvents,
    )
    .await?;

    if count == 1 {
        for attendee in &meeting.users {
            info!(
                "Meeting {} attendance for user {}: {:?}",
                meeting.internal_meeting_id, attendee.user_id, attendee
            );
            notifier
                .enqueue_completion(db, activity, &attendee.user_id)
                .await?;
        }
        Ok(CallbackOutcome::Enqueued)
    } else {
        debug!(
            "meeting_events already processed for meeting: {}",
            meeting.internal_meeting_id
        );
        Ok(CallbackOutcome::AlreadyProcessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use crate::test_support::{activity_model, callback_event_model, CountingNotifier};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    const SECRET: &str = "s3cret";

    fn recording_ready_token(meeting_id: &str, record_id: Option<&str>, secret: &str) -> String {
        let claims = RecordingReadyClaims {
            meeting_id: meeting_id.to_string(),
            record_id: record_id.map(str::to_string),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn meeting_events_bearer(secret: &str) -> String {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &serde_json::json!({}),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    fn meeting_events_body(external: &str, internal: &str, user_ids: &[&str]) -> String {
        let users: Vec<serde_json::Value> = user_ids
            .iter()
            .map(|id| serde_json::json!({"external-user-id": id, "name": "User"}))
            .collect();
        serde_json::json!({
            "data": {
                "attributes": {
                    "meeting": {
                        "external-meeting-id": external,
                        "internal-meeting-id": internal,
                        "users": users,
                    }
                }
            }
        })
        .to_string()
    }

    fn count_result(count: i64) -> Vec<BTreeMap<&'static str, sea_orm::Value>> {
        vec![BTreeMap::from([(
            "num_items",
            sea_orm::Value::BigInt(Some(count)),
        )])]
    }

    #[test]
    fn meeting_id_prefix_strips_breakout_index_and_qualifier() {
        assert_eq!(meeting_id_prefix("ABC-123[0]"), "ABC");
        assert_eq!(meeting_id_prefix("ABC[2]"), "ABC");
        assert_eq!(meeting_id_prefix("ABC-123"), "ABC");
        assert_eq!(meeting_id_prefix("ABC"), "ABC");
    }

    #[tokio::test]
    async fn recording_ready_notifies_once_and_always_appends() -> Result<(), Error> {
        let activity = activity_model("ABC");
        let token = recording_ready_token("ABC-123[0]", Some("rec-1"), SECRET);

        // First delivery: count 0, then the append.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![count_result(0)])
            .append_query_results(vec![vec![callback_event_model(
                "rec-1",
                CallbackKind::RecordingReady,
            )]])
            .into_connection();
        let notifier = CountingNotifier::default();

        let outcome =
            recording_ready(&db, &notifier, Some(&activity), SECRET, &token).await?;

        assert_eq!(outcome, CallbackOutcome::Accepted);
        assert_eq!(notifier.recording_ready_sends(), 1);

        // Retried delivery: count 1, still appended, but not re-notified.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![count_result(1)])
            .append_query_results(vec![vec![callback_event_model(
                "rec-1",
                CallbackKind::RecordingReady,
            )]])
            .into_connection();
        let notifier = CountingNotifier::default();

        let outcome =
            recording_ready(&db, &notifier, Some(&activity), SECRET, &token).await?;

        assert_eq!(outcome, CallbackOutcome::Accepted);
        assert_eq!(notifier.recording_ready_sends(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn recording_ready_without_record_id_notifies_unconditionally() -> Result<(), Error> {
        let activity = activity_model("ABC");
        let token = recording_ready_token("ABC", None, SECRET);

        // Legacy path touches neither the count nor the append.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        let outcome =
            recording_ready(&db, &notifier, Some(&activity), SECRET, &token).await?;

        assert_eq!(outcome, CallbackOutcome::Accepted);
        assert_eq!(notifier.recording_ready_sends(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn recording_ready_rejects_a_bad_signature_before_any_side_effect() {
        let activity = activity_model("ABC");
        let token = recording_ready_token("ABC", Some("rec-1"), "wrong-secret");

        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        let err = recording_ready(&db, &notifier, Some(&activity), SECRET, &token)
            .await
            .unwrap_err();

        assert!(matches!(err.error_kind, DomainErrorKind::Verification(_)));
        assert_eq!(notifier.recording_ready_sends(), 0);
    }

    #[tokio::test]
    async fn recording_ready_reports_gone_for_a_mismatched_or_missing_activity() {
        let token = recording_ready_token("ABC-123[0]", Some("rec-1"), SECRET);
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        let mismatched = activity_model("XYZ");
        let err = recording_ready(&db, &notifier, Some(&mismatched), SECRET, &token)
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, DomainErrorKind::Stale);

        let err = recording_ready(&db, &notifier, None, SECRET, &token)
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, DomainErrorKind::Stale);

        assert_eq!(notifier.recording_ready_sends(), 0);
    }

    #[tokio::test]
    async fn recording_ready_maps_downstream_failures_to_unavailable() {
        let activity = activity_model("ABC");
        let token = recording_ready_token("ABC", Some("rec-1"), SECRET);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![count_result(0)])
            .into_connection();
        let notifier = CountingNotifier::failing();

        let err = recording_ready(&db, &notifier, Some(&activity), SECRET, &token)
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn meeting_events_enqueues_each_attendee_on_first_delivery() -> Result<(), Error> {
        let activity = activity_model("ABC");
        let body = meeting_events_body("ABC-123[0]", "internal-1", &["u1", "u2"]);

        // Append first, then the count reads 1: first delivery.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![callback_event_model(
                "internal-1",
                CallbackKind::MeetingEvents,
            )]])
            .append_query_results(vec![count_result(1)])
            .into_connection();
        let notifier = CountingNotifier::default();

        let outcome = meeting_events(
            &db,
            &notifier,
            Some(&activity),
            SECRET,
            Some(&meeting_events_bearer(SECRET)),
            &body,
        )
        .await?;

        assert_eq!(outcome, CallbackOutcome::Enqueued);
        assert_eq!(
            notifier.completion_enqueues(),
            vec!["u1".to_string(), "u2".to_string()]
        );

        Ok(())
    }

    #[tokio::test]
    async fn meeting_events_skips_attendees_on_a_repeated_delivery() -> Result<(), Error> {
        let activity = activity_model("ABC");
        let body = meeting_events_body("ABC", "internal-1", &["u1"]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![callback_event_model(
                "internal-1",
                CallbackKind::MeetingEvents,
            )]])
            .append_query_results(vec![count_result(2)])
            .into_connection();
        let notifier = CountingNotifier::default();

        let outcome = meeting_events(
            &db,
            &notifier,
            Some(&activity),
            SECRET,
            Some(&meeting_events_bearer(SECRET)),
            &body,
        )
        .await?;

        assert_eq!(outcome, CallbackOutcome::AlreadyProcessed);
        assert!(notifier.completion_enqueues().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn meeting_events_requires_a_bearer_authorization_header() {
        let activity = activity_model("ABC");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        for authorization in [None, Some("Basic dXNlcg==")] {
            let err = meeting_events(
                &db,
                &notifier,
                Some(&activity),
                SECRET,
                authorization,
                &meeting_events_body("ABC", "internal-1", &[]),
            )
            .await
            .unwrap_err();

            assert!(matches!(err.error_kind, DomainErrorKind::Verification(_)));
        }
    }

    #[tokio::test]
    async fn meeting_events_rejects_a_malformed_body() {
        let activity = activity_model("ABC");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        for body in ["not json", r#"{"data": {"attributes": {}}}"#] {
            let err = meeting_events(
                &db,
                &notifier,
                Some(&activity),
                SECRET,
                Some(&meeting_events_bearer(SECRET)),
                body,
            )
            .await
            .unwrap_err();

            assert!(matches!(err.error_kind, DomainErrorKind::Verification(_)));
        }

        assert!(notifier.completion_enqueues().is_empty());
    }

    #[tokio::test]
    async fn meeting_events_reports_gone_for_a_mismatched_activity() {
        let activity = activity_model("XYZ");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = CountingNotifier::default();

        let err = meeting_events(
            &db,
            &notifier,
            Some(&activity),
            SECRET,
            Some(&meeting_events_bearer(SECRET)),
            &meeting_events_body("ABC-123[0]", "internal-1", &["u1"]),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_kind, DomainErrorKind::Stale);
        assert!(notifier.completion_enqueues().is_empty());
    }
}
