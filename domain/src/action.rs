//! Recording lifecycle action dispatch.
//!
//! Routes a named action to the right combination of local-store and
//! remote-catalog operations. Imported links are read-only pointers to the
//! canonical recording: the state-changing actions refuse to touch the
//! remote catalog through them, and delete removes only the pointer row.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::gateway::catalog::RemoteCatalog;
use crate::recording::UnifiedRecording;
use entity_api::recording;
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status string returned when a state-changing action targets an imported link.
pub const IMPORTED_LINK_RESTRICTION: &str =
    "This action can not be performed on imported links.";

/// The closed set of recording lifecycle actions. An unknown action name
/// fails deserialization at the boundary instead of silently doing nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingAction {
    Publish,
    Unpublish,
    Protect,
    Unprotect,
    Edit,
    Delete,
}

impl std::fmt::Display for RecordingAction {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingAction::Publish => write!(fmt, "publish"),
            RecordingAction::Unpublish => write!(fmt, "unpublish"),
            RecordingAction::Protect => write!(fmt, "protect"),
            RecordingAction::Unprotect => write!(fmt, "unprotect"),
            RecordingAction::Edit => write!(fmt, "edit"),
            RecordingAction::Delete => write!(fmt, "delete"),
        }
    }
}

/// Result of a dispatched action. The status text is either the remote
/// catalog's status string or a fixed policy message; a policy refusal is a
/// defined outcome, not a failure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub status: String,
}

impl ActionOutcome {
    fn new(status: impl Into<String>) -> Self {
        ActionOutcome {
            status: status.into(),
        }
    }
}

fn invalid_params() -> Error {
    Error::from_kind(DomainErrorKind::Internal(InternalErrorKind::Entity(
        EntityErrorKind::Invalid,
    )))
}

/// Decodes the `meta` action parameter: a JSON-encoded object of fields.
fn decode_meta(meta: Option<&str>) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    let meta = meta.ok_or_else(invalid_params)?;
    match serde_json::from_str(meta) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(_) | Err(_) => Err(invalid_params()),
    }
}

/// Performs a lifecycle action on a recording present in the unified view.
///
/// For non-imported deletes, every imported pointer to the recording is
/// removed from the local store before the catalog delete is issued, so no
/// pointer can outlive the recording it points to.
pub async fn perform(
    db: &DatabaseConnection,
    catalog: &dyn RemoteCatalog,
    action: RecordingAction,
    recording_id: &str,
    meta: Option<&str>,
    unified: &HashMap<String, UnifiedRecording>,
) -> Result<ActionOutcome, Error> {
    let recording = unified.get(recording_id).ok_or_else(|| {
        warn!("Action {action} targets a recording not in view: {recording_id}");
        Error::from_kind(DomainErrorKind::Internal(InternalErrorKind::Entity(
            EntityErrorKind::NotFound,
        )))
    })?;

    debug!("Performing {action} on recording: {recording_id}");

    match action {
        RecordingAction::Publish | RecordingAction::Unpublish => {
            if recording.imported {
                return Ok(ActionOutcome::new(IMPORTED_LINK_RESTRICTION));
            }
            let publish = action == RecordingAction::Publish;
            Ok(ActionOutcome::new(
                catalog.publish(recording_id, publish).await?,
            ))
        }
        RecordingAction::Protect | RecordingAction::Unprotect => {
            if recording.imported {
                return Ok(ActionOutcome::new(IMPORTED_LINK_RESTRICTION));
            }
            let mut fields = serde_json::Map::new();
            fields.insert(
                "protect".to_string(),
                serde_json::Value::Bool(action == RecordingAction::Protect),
            );
            Ok(ActionOutcome::new(
                catalog.update(recording_id, &fields).await?,
            ))
        }
        RecordingAction::Edit => {
            let fields = decode_meta(meta)?;
            if recording.imported {
                // Edits to a link touch only the frozen local overlay.
                recording::merge_payload(db, recording.local_id, &fields).await?;
                Ok(ActionOutcome::new("imported link updated"))
            } else {
                Ok(ActionOutcome::new(
                    catalog.update(recording_id, &fields).await?,
                ))
            }
        }
        RecordingAction::Delete => {
            if recording.imported {
                // Only the pointer row goes; the canonical recording stays.
                recording::delete_by_id(db, recording.local_id).await?;
                Ok(ActionOutcome::new("imported link deleted"))
            } else {
                // Cascade must complete before the remote delete is issued.
                recording::delete_imported_links(db, recording_id).await?;
                Ok(ActionOutcome::new(catalog.delete(recording_id).await?))
            }
        }
    }
}
