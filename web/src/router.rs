use crate::{controller::health_check_controller, params, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::controller::{callback_controller, recording_controller};

use axum::http::{header, HeaderValue, Method};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Conference Bridge API"
        ),
        paths(
            recording_controller::index,
            recording_controller::action,
            recording_controller::import,
            callback_controller::recording_ready,
            callback_controller::meeting_events,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::recordings::Model,
                domain::activities::Model,
                params::callback::RecordingReadyParams,
            )
        ),
        tags(
            (name = "conference_bridge", description = "Conferencing integration API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(recording_routes(app_state.clone()))
        .merge(callback_routes(app_state.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors_layer(&app_state))
        .fallback_service(static_routes())
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn recording_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/recordings", get(recording_controller::index))
        .route(
            "/recordings/:recording_id/action",
            post(recording_controller::action),
        )
        .route(
            "/recordings/:recording_id/import",
            post(recording_controller::import),
        )
        .with_state(app_state)
}

// Callback endpoints authenticate per delivery with a signed token, so no
// session middleware applies here.
fn callback_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/callbacks/:activity_id/recording_ready",
            post(callback_controller::recording_ready),
        )
        .route(
            "/callbacks/:activity_id/meeting_events",
            post(callback_controller::meeting_events),
        )
        .with_state(app_state)
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

// This will serve static files that we can use as a "fallback" for when the server panics
pub fn static_routes() -> Router {
    Router::new().nest_service("/", ServeDir::new("./"))
}
