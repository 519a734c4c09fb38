use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `log_level` when set. With `json` the output is one
/// flattened JSON object per event, otherwise human-readable lines.
pub fn init_tracing(service_name: &str, log_level: &str, json: bool) -> Result<(), AppError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to initialize tracing for service '{}': {}",
            service_name,
            e
        ))
    })?;

    tracing::info!(service = service_name, log_level, "Tracing initialized");
    Ok(())
}
