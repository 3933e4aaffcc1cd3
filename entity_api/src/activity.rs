//! Lookup operations for the activities table.

use super::error::Error;
use entity::activities::{Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, DatabaseConnection};

/// Finds an activity by id. Returns None when the activity has been deleted,
/// which the callback layer reports as "gone".
pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}
