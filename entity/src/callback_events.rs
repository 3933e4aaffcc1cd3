//! SeaORM Entity for the callback_events table.
//! Append-only log of processed callback deliveries, queried by correlation
//! id to guard against duplicate processing. Rows are never updated or
//! deleted by the application.

use crate::callback_kind::CallbackKind;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::callback_events::Model)]
#[sea_orm(schema_name = "conference_bridge", table_name = "callback_events")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    /// Remote record id or internal meeting id, depending on the kind
    pub correlation_id: String,

    #[schema(value_type = String)]
    pub kind: CallbackKind,

    #[schema(value_type = Object)]
    pub payload: Json,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
