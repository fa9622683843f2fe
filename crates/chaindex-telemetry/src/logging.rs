use chaindex_types::{ChaindexError, LoggingConfig, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Fails if a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_ansi(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_ansi(true))
            .try_init()
    };

    installed.map_err(|e| ChaindexError::Configuration(format!("tracing init: {e}")))
}
