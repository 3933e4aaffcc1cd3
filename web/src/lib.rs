pub use service::AppState;

mod controller;
mod error;
pub(crate) mod params;
pub mod router;

pub use error::{Error, Result};
pub use router::define_routes;
