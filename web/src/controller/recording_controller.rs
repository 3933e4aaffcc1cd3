//! Controller for unified recording listings and lifecycle actions.
//!
//! Recordings live in two places: pointer rows in the local database and
//! the authoritative entries in the remote conferencing server's catalog.
//! Every endpoint here works on the merged view of the two.

use crate::controller::ApiResponse;
use crate::params;
use crate::{AppState, Error};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use domain::action as ActionApi;
use domain::gateway::catalog::HttpCatalog;
use domain::recording as RecordingApi;
use domain::recording::{RecordingFilter, SortDirection, UnifiedRecording};
use log::*;
use std::str::FromStr;

/// GET /recordings
///
/// Lists recordings for a course or activity, merged with the remote
/// catalog. With `importable=true` and an `activity_id`, recordings that
/// activity has already imported are dropped from the listing.
#[utoipa::path(
    get,
    path = "/recordings",
    params(
        params::recording::IndexParams,
    ),
    responses(
        (status = 200, description = "Successfully retrieved all matching recordings"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 502, description = "Remote catalog unreachable"),
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(index_params): Query<params::recording::IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all recordings with params: {index_params:?}");

    let catalog = HttpCatalog::from_config(&app_state.config)?;
    let filter = index_params.filter();

    let mut unified =
        RecordingApi::reconcile(app_state.db_conn_ref(), &catalog, &filter).await?;

    if index_params.importable {
        if let Some(activity_id) = index_params.activity_id {
            unified = RecordingApi::remove_already_imported(
                app_state.db_conn_ref(),
                unified,
                index_params.course_id,
                activity_id,
            )
            .await?;
        }
    }

    let direction = match index_params.sort_order {
        Some(order) => order.into(),
        None => SortDirection::from_str(app_state.config.recordings_sort_order())?,
    };

    let mut recordings: Vec<UnifiedRecording> = unified.into_values().collect();
    RecordingApi::sort_by_start_time(&mut recordings, direction);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), recordings)))
}

/// POST /recordings/{recording_id}/action
///
/// Dispatches a lifecycle action (publish, unpublish, protect, unprotect,
/// edit, delete) against a recording in the caller's unified view. An
/// action name outside the closed set is rejected at deserialization.
#[utoipa::path(
    post,
    path = "/recordings/{recording_id}/action",
    params(
        ("recording_id" = String, Path, description = "Remote catalog recording id"),
        params::recording::ActionParams,
    ),
    responses(
        (status = 200, description = "Action performed"),
        (status = 404, description = "Recording not found in the unified view"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 502, description = "Remote catalog unreachable"),
    )
)]
pub async fn action(
    State(app_state): State<AppState>,
    Path(recording_id): Path<String>,
    Query(action_params): Query<params::recording::ActionParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST {} on recording: {recording_id}",
        action_params.action
    );

    let catalog = HttpCatalog::from_config(&app_state.config)?;

    // Actions operate on the same merged view listings show, imported
    // links included.
    let filter = RecordingFilter {
        course_id: action_params.course_id,
        activity_id: action_params.activity_id,
        only_from_instance: action_params.activity_id.is_some(),
        include_deleted: false,
        include_imported: true,
        only_imported: false,
    };
    let unified = RecordingApi::reconcile(app_state.db_conn_ref(), &catalog, &filter).await?;

    let outcome = ActionApi::perform(
        app_state.db_conn_ref(),
        &catalog,
        action_params.action,
        &recording_id,
        action_params.meta.as_deref(),
        &unified,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), outcome)))
}

/// POST /recordings/{recording_id}/import
///
/// Creates an imported link to a recording owned by another activity,
/// freezing its remote metadata at import time.
#[utoipa::path(
    post,
    path = "/recordings/{recording_id}/import",
    params(
        ("recording_id" = String, Path, description = "Remote catalog recording id"),
        params::recording::ImportParams,
    ),
    responses(
        (status = 201, description = "Imported link created", body = domain::recordings::Model),
        (status = 404, description = "Recording unknown to the remote catalog"),
        (status = 502, description = "Remote catalog unreachable"),
    )
)]
pub async fn import(
    State(app_state): State<AppState>,
    Path(recording_id): Path<String>,
    Query(import_params): Query<params::recording::ImportParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST import recording {recording_id} into activity: {}",
        import_params.activity_id
    );

    let catalog = HttpCatalog::from_config(&app_state.config)?;

    let link = RecordingApi::import(
        app_state.db_conn_ref(),
        &catalog,
        import_params.course_id,
        import_params.activity_id,
        &recording_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), link)))
}
