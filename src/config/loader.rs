//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.upstream.port, 8501);
        assert_eq!(config.static_assets.prefix, "/static/");
        assert!(!config.forwarding.trust_forwarded_headers);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            port = 9000

            [redirect]
            enforce_https = true

            [cors]
            strict_transport_security = "max-age=31536000; includeSubDomains; preload"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.host, "127.0.0.1");
        assert_eq!(config.upstream.port, 9000);
        assert!(config.redirect.enforce_https);
        assert_eq!(config.redirect.entry_path, "/static/index.html");
        assert_eq!(config.cors.allow_origin, "*");
        assert!(config.cors.strict_transport_security.is_some());
    }

    #[test]
    fn validation_failures_are_reported() {
        let err = parse_config("[upstream]\nport = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::ZeroUpstreamPort]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            parse_config("[upstream\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
