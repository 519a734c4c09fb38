//! School Records bootstrap check.
//!
//! Loads configuration, installs tracing, opens the configured store and
//! reports how many active users it holds.

use school_records::config::RecordsConfig;
use school_records::startup::{build_user_store, init_observability};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = RecordsConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_observability(&config).map_err(|e| {
        eprintln!("Failed to initialize tracing: {}", e);
        std::io::Error::other(format!("Tracing error: {}", e))
    })?;

    let users = build_user_store(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build record store");
        std::io::Error::other(format!("Store error: {}", e))
    })?;

    let active = users.list_active().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list active users");
        std::io::Error::other(format!("Store error: {}", e))
    })?;

    tracing::info!(active_users = active.len(), "Record store ready");
    Ok(())
}
