use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of work a notification_jobs row represents.
#[derive(
    Debug, Clone, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_kind")]
pub enum NotificationKind {
    /// Notify course participants that a recording is available
    #[sea_orm(string_value = "recording_ready")]
    #[default]
    RecordingReady,
    /// Recompute activity completion for one user after attendance events
    #[sea_orm(string_value = "completion_update")]
    CompletionUpdate,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::RecordingReady => write!(fmt, "recording_ready"),
            NotificationKind::CompletionUpdate => write!(fmt, "completion_update"),
        }
    }
}
