//! Storage services for audited records.
//!
//! [`Repository`] is the save path: it runs the audit hooks, validates
//! attribution, and enforces optimistic concurrency on `version`.

pub mod clock;
mod database;
pub mod error;
mod memory;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use database::PgStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{update_with_retry, Repository};
