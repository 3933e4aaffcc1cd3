pub use entity::{
    activities, callback_events, callback_kind, notification_jobs, notification_kind, recordings,
    Id,
};

pub mod activity;
pub mod callback_event;
pub mod error;
pub mod notification_job;
pub mod recording;
