//! Controller for callbacks delivered by the remote conferencing server.
//!
//! These endpoints are unauthenticated at the session level; each delivery
//! authenticates itself with a JWT signed by the shared secret. Status
//! codes matter here: the remote server retries on 5xx and stops
//! re-delivering on 410.

use crate::params;
use crate::{AppState, Error};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use domain::callback as CallbackApi;
use domain::callback::CallbackOutcome;
use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use domain::activity as ActivityApi;
use domain::notification::JobQueue;
use domain::Id;
use log::*;

fn missing_secret() -> Error {
    error!("Callback received but no shared secret is configured");
    Error::from(DomainError {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    })
}

/// POST /callbacks/{activity_id}/recording_ready
///
/// Acknowledges a recording-ready delivery. The JWT in the body is
/// verified with HS256; the notification fires at most once per record id
/// across retried deliveries.
#[utoipa::path(
    post,
    path = "/callbacks/{activity_id}/recording_ready",
    params(
        ("activity_id" = Uuid, Path, description = "Activity the callback was registered for"),
    ),
    request_body = params::callback::RecordingReadyParams,
    responses(
        (status = 202, description = "Delivery acknowledged"),
        (status = 400, description = "Signature verification failed"),
        (status = 410, description = "Activity no longer exists; stop retrying"),
        (status = 503, description = "Downstream failure; retry later"),
    )
)]
pub async fn recording_ready(
    State(app_state): State<AppState>,
    Path(activity_id): Path<Id>,
    Json(callback_params): Json<params::callback::RecordingReadyParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST recording_ready callback for activity: {activity_id}");

    let shared_secret = app_state.config.shared_secret().ok_or_else(missing_secret)?;
    let activity = ActivityApi::find_by_id(app_state.db_conn_ref(), activity_id).await?;

    CallbackApi::recording_ready(
        app_state.db_conn_ref(),
        &JobQueue,
        activity.as_ref(),
        &shared_secret,
        &callback_params.signed_parameters,
    )
    .await?;

    Ok((StatusCode::ACCEPTED, "ACCEPTED"))
}

/// POST /callbacks/{activity_id}/meeting_events
///
/// Processes a meeting-events delivery. The bearer token is verified with
/// HS512; the JSON body must decode into the meeting-events schema. The
/// first delivery of an internal meeting id enqueues completion updates
/// for each attendee; repeats are logged and acknowledged.
#[utoipa::path(
    post,
    path = "/callbacks/{activity_id}/meeting_events",
    params(
        ("activity_id" = Uuid, Path, description = "Activity the callback was registered for"),
    ),
    responses(
        (status = 200, description = "First delivery; attendee processing enqueued"),
        (status = 202, description = "Repeated delivery; no processing happened"),
        (status = 400, description = "Missing or invalid bearer token, or malformed body"),
        (status = 410, description = "Activity no longer exists; stop retrying"),
    )
)]
pub async fn meeting_events(
    State(app_state): State<AppState>,
    Path(activity_id): Path<Id>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, Error> {
    debug!("POST meeting_events callback for activity: {activity_id}");

    let shared_secret = app_state.config.shared_secret().ok_or_else(missing_secret)?;
    let activity = ActivityApi::find_by_id(app_state.db_conn_ref(), activity_id).await?;

    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let outcome = CallbackApi::meeting_events(
        app_state.db_conn_ref(),
        &JobQueue,
        activity.as_ref(),
        &shared_secret,
        authorization,
        &body,
    )
    .await?;

    Ok(match outcome {
        CallbackOutcome::Enqueued => (StatusCode::OK, "OK. Enqueued."),
        _ => (StatusCode::ACCEPTED, "ACCEPTED"),
    })
}
