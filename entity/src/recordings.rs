//! SeaORM Entity for the recordings table.
//! Local recording metadata rows. The remote conferencing server owns the
//! recording itself; an `imported` row is a pointer that lets a second
//! activity present the same remote recording without owning it.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::recordings::Model)]
#[sea_orm(schema_name = "conference_bridge", table_name = "recordings")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    /// Key of the recording in the remote catalog
    pub recording_id: String,

    #[schema(value_type = Uuid)]
    pub activity_id: Id,

    pub course_id: i64,

    /// True if this row is a pointer to a recording owned by another activity
    pub imported: bool,

    /// True once the originating activity has been deleted; hidden from
    /// normal listings
    pub headless: bool,

    /// Opaque structured metadata. For imported rows this holds the remote
    /// `meta_*` fields frozen at import time.
    #[schema(value_type = Object)]
    pub payload: Json,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activities::Entity",
        from = "Column::ActivityId",
        to = "super::activities::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Activities,
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
