//! CRUD and query operations for the recordings table.

use super::error::{EntityApiErrorKind, Error};
use entity::recordings::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    Condition, DatabaseConnection, QueryOrder, TryIntoModel,
};

/// Selection rules for local recording rows. All clauses are conjunctive;
/// see [`RecordingFilter::condition`] for how each field narrows the query.
#[derive(Clone, Debug, Default)]
pub struct RecordingFilter {
    pub course_id: i64,
    pub activity_id: Option<Id>,
    /// With `activity_id` set: restrict to that activity instead of the
    /// "other activities in the same course" scope used for import listings
    pub only_from_instance: bool,
    /// Include headless rows (originating activity deleted)
    pub include_deleted: bool,
    pub include_imported: bool,
    /// With `include_imported`: require imported rows instead of allowing them
    pub only_imported: bool,
}

impl RecordingFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if !self.include_deleted {
            condition = condition.add(Column::Headless.eq(false));
        }

        if !self.include_imported {
            condition = condition.add(Column::Imported.eq(false));
        } else if self.only_imported {
            condition = condition.add(Column::Imported.eq(true));
        }

        match self.activity_id {
            None => condition.add(Column::CourseId.eq(self.course_id)),
            Some(activity_id) if self.only_from_instance => {
                condition.add(Column::ActivityId.eq(activity_id))
            }
            Some(activity_id) => condition
                .add(Column::ActivityId.ne(activity_id))
                .add(Column::CourseId.eq(self.course_id)),
        }
    }
}

/// Finds all recording rows matching the filter, in insertion order.
pub async fn find_all_by(
    db: &DatabaseConnection,
    filter: &RecordingFilter,
) -> Result<Vec<Model>, Error> {
    debug!("Finding recordings by filter: {filter:?}");

    Ok(Entity::find()
        .filter(filter.condition())
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Finds the remote recording ids that already have an imported pointer row
/// for the given (course, activity) scope.
pub async fn find_imported_recording_ids(
    db: &DatabaseConnection,
    course_id: i64,
    activity_id: Id,
) -> Result<Vec<String>, Error> {
    let rows = Entity::find()
        .filter(
            Condition::all()
                .add(Column::Imported.eq(true))
                .add(Column::CourseId.eq(course_id))
                .add(Column::ActivityId.eq(activity_id)),
        )
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|row| row.recording_id).collect())
}

/// Creates an imported pointer row for a remote recording. The payload holds
/// the remote `meta_*` fields frozen at import time.
pub async fn create_imported(
    db: &DatabaseConnection,
    recording_id: &str,
    activity_id: Id,
    course_id: i64,
    payload: serde_json::Value,
) -> Result<Model, Error> {
    debug!("Creating imported recording link for: {recording_id}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        recording_id: Set(recording_id.to_string()),
        activity_id: Set(activity_id),
        course_id: Set(course_id),
        imported: Set(true),
        headless: Set(false),
        payload: Set(payload),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Merges the given fields into a recording row's stored payload object.
/// Existing keys are overwritten; keys not present in `fields` are kept.
pub async fn merge_payload(
    db: &DatabaseConnection,
    id: Id,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;

    let mut payload = match existing.payload.clone() {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (key, value) in fields {
        payload.insert(key.clone(), value.clone());
    }

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        recording_id: Unchanged(existing.recording_id),
        activity_id: Unchanged(existing.activity_id),
        course_id: Unchanged(existing.course_id),
        imported: Unchanged(existing.imported),
        headless: Unchanged(existing.headless),
        payload: Set(serde_json::Value::Object(payload)),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Finds a recording row by its local id
pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Deletes a recording row by its local id
pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    let model = find_by_id(db, id).await?;
    Entity::delete_by_id(model.id).exec(db).await?;
    Ok(())
}

/// Deletes every imported pointer row for the given remote recording id,
/// across all courses and activities. Returns the number of rows removed.
pub async fn delete_imported_links(
    db: &DatabaseConnection,
    recording_id: &str,
) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(
            Condition::all()
                .add(Column::Imported.eq(true))
                .add(Column::RecordingId.eq(recording_id)),
        )
        .exec(db)
        .await?;

    debug!(
        "Deleted {} imported link(s) for recording: {recording_id}",
        result.rows_affected
    );

    Ok(result.rows_affected)
}
