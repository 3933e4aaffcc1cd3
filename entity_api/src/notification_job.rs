//! Insert operations for the notification_jobs work queue.

use super::error::Error;
use entity::notification_jobs::{ActiveModel, Model};
use entity::notification_kind::NotificationKind;
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, TryIntoModel};

/// Enqueues a notification job for an external worker to pick up.
pub async fn create(
    db: &DatabaseConnection,
    activity_id: Id,
    user_id: Option<&str>,
    kind: NotificationKind,
) -> Result<Model, Error> {
    debug!("Enqueueing {kind} job for activity: {activity_id}");

    let active_model = ActiveModel {
        activity_id: Set(activity_id),
        user_id: Set(user_id.map(str::to_string)),
        kind: Set(kind),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn create_returns_a_new_job() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let model = Model {
            id: Id::new_v4(),
            activity_id: Id::new_v4(),
            user_id: Some("lms-user-42".to_string()),
            kind: NotificationKind::CompletionUpdate,
            created_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let job = create(
            &db,
            model.activity_id,
            model.user_id.as_deref(),
            NotificationKind::CompletionUpdate,
        )
        .await?;

        assert_eq!(job.user_id, model.user_id);
        assert_eq!(job.kind, NotificationKind::CompletionUpdate);

        Ok(())
    }
}
