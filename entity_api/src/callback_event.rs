//! Append-only operations for the callback_events table.
//!
//! The count/append pair here is the idempotence signal for callback
//! processing. Note there is no transactional guard between a count and a
//! subsequent append; concurrent duplicate deliveries can race. See the
//! design notes in DESIGN.md.

use super::error::Error;
use entity::callback_events::{ActiveModel, Column, Entity, Model};
use entity::callback_kind::CallbackKind;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, Condition, DatabaseConnection, PaginatorTrait,
    TryIntoModel,
};

/// Counts logged callback events for a correlation id and callback kind.
pub async fn count_by_correlation(
    db: &DatabaseConnection,
    correlation_id: &str,
    kind: CallbackKind,
) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(
            Condition::all()
                .add(Column::CorrelationId.eq(correlation_id))
                .add(Column::Kind.eq(kind)),
        )
        .count(db)
        .await?)
}

/// Appends a callback event row. Rows are never mutated afterwards.
pub async fn create(
    db: &DatabaseConnection,
    correlation_id: &str,
    kind: CallbackKind,
    payload: serde_json::Value,
) -> Result<Model, Error> {
    debug!("Logging {kind} callback event for correlation id: {correlation_id}");

    let active_model = ActiveModel {
        correlation_id: Set(correlation_id.to_string()),
        kind: Set(kind),
        payload: Set(payload),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::Id;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn count_by_correlation_reads_num_items() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([(
                "num_items",
                sea_orm::Value::BigInt(Some(2)),
            )])]])
            .into_connection();

        let count = count_by_correlation(&db, "rec-abc123", CallbackKind::RecordingReady).await?;

        assert_eq!(count, 2);

        Ok(())
    }

    #[tokio::test]
    async fn create_returns_the_appended_event() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let model = Model {
            id: Id::new_v4(),
            correlation_id: "internal-mtg-1".to_string(),
            kind: CallbackKind::MeetingEvents,
            payload: serde_json::json!({"meeting_id": "activity-1"}),
            created_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let event = create(
            &db,
            &model.correlation_id,
            CallbackKind::MeetingEvents,
            model.payload.clone(),
        )
        .await?;

        assert_eq!(event.correlation_id, model.correlation_id);
        assert_eq!(event.kind, CallbackKind::MeetingEvents);

        Ok(())
    }
}
