use serde::{Deserialize, Serialize};

use crate::models::UserSummary;

/// Token type used when none is given.
pub const BEARER: &str = "Bearer";

fn default_token_type() -> String {
    BEARER.to_string()
}

/// Token pair plus user summary returned after a successful sign-in.
///
/// Immutable once built: fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    user: UserSummary,
}

impl AuthResponse {
    /// Build a response with the default `"Bearer"` token type.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
        user: UserSummary,
    ) -> Self {
        Self::with_token_type(access_token, refresh_token, BEARER, expires_in, user)
    }

    /// Build a response with an explicit token type.
    pub fn with_token_type(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: i64,
        user: UserSummary,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: token_type.into(),
            expires_in,
            user,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Seconds until the access token expires.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    pub fn user(&self) -> &UserSummary {
        &self.user
    }

    /// Value for an `Authorization` header, e.g. `Bearer eyJ...`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
