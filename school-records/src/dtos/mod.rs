pub mod auth;

pub use auth::{AuthResponse, BEARER};
