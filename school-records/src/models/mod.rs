pub mod audit;
pub mod user;

pub use audit::{AuditFields, HasAuditFields, MAX_ATTRIBUTION_LEN};
pub use user::{Role, User, UserSummary};
