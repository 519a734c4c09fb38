//! service-core: Shared infrastructure for the school-records crates.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
