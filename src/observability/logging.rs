//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the output format (pretty or JSON) from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - Initialization is idempotent: a second call is a no-op, which keeps
//!   tests that start several gateways in one process working

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` first, then the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = env_filter(config);
    let result = match config.log_format.as_str() {
        "json" => fmt().with_env_filter(filter).json().try_init(),
        _ => fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        let config = ObservabilityConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn invalid_level_falls_back() {
        let config = ObservabilityConfig {
            log_level: "not[a]filter".into(),
            ..ObservabilityConfig::default()
        };
        let _ = env_filter(&config);
    }
}
