//! Completion-tracking and notification sinks.
//!
//! The callback processor only ever hands work off: recording-ready
//! announcements and per-user completion updates are enqueued for an
//! external worker, never executed inline. The [`Notifier`] trait is the
//! seam; [`JobQueue`] is the production implementation backed by the
//! notification_jobs table.

use crate::error::Error;
use async_trait::async_trait;
use entity::activities;
use entity::notification_kind::NotificationKind;
use entity_api::notification_job;
use log::*;
use sea_orm::DatabaseConnection;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announces to course participants that a recording is available.
    async fn recording_ready(
        &self,
        db: &DatabaseConnection,
        activity: &activities::Model,
    ) -> Result<(), Error>;

    /// Enqueues a completion-tracking recomputation for one user.
    async fn enqueue_completion(
        &self,
        db: &DatabaseConnection,
        activity: &activities::Model,
        user_id: &str,
    ) -> Result<(), Error>;
}

/// Production notifier writing rows into the notification_jobs queue.
pub struct JobQueue;

#[async_trait]
impl Notifier for JobQueue {
    async fn recording_ready(
        &self,
        db: &DatabaseConnection,
        activity: &activities::Model,
    ) -> Result<(), Error> {
        info!(
            "Enqueueing recording-ready notification for activity: {}",
            activity.id
        );
        notification_job::create(db, activity.id, None, NotificationKind::RecordingReady).await?;
        Ok(())
    }

    async fn enqueue_completion(
        &self,
        db: &DatabaseConnection,
        activity: &activities::Model,
        user_id: &str,
    ) -> Result<(), Error> {
        notification_job::create(
            db,
            activity.id,
            Some(user_id),
            NotificationKind::CompletionUpdate,
        )
        .await?;
        Ok(())
    }
}
