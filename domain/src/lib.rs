//! Business logic for the conference bridge: recording reconciliation,
//! lifecycle action dispatch, and callback processing.
//!
//! This crate re-exports the entity-layer items consumers need so that the
//! `web` crate never depends on `entity_api` directly; the domain layer is
//! the single boundary it talks through.

pub use entity_api::{activities, activity, callback_events, callback_kind, recordings, Id};

pub mod action;
pub mod callback;
pub mod error;
pub mod notification;
pub mod recording;
pub mod signature;

pub mod gateway;

#[cfg(test)]
pub(crate) mod test_support;
