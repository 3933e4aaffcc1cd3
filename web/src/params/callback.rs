use serde::Deserialize;
use utoipa::ToSchema;

/// Body of a recording-ready callback: a single JWT whose claims carry the
/// meeting id and, on newer remote servers, the record id.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RecordingReadyParams {
    pub(crate) signed_parameters: String,
}
