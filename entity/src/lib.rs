use uuid::Uuid;

pub mod activities;
pub mod callback_events;
pub mod callback_kind;
pub mod notification_jobs;
pub mod notification_kind;
pub mod recordings;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
