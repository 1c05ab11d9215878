//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, ports and path shapes
//! - Check every CORS/security value is a legal header value
//! - Detect an entry redirect that would loop onto itself
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} {value:?} is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.host must not be empty")]
    EmptyUpstreamHost,

    #[error("upstream.port must be non-zero")]
    ZeroUpstreamPort,

    #[error("{field} must start with '/': {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("static_assets.prefix must start and end with '/': {0:?}")]
    InvalidStaticPrefix(String),

    #[error("redirect.entry_path {0:?} is itself a redirect source")]
    RedirectLoop(String),

    #[error("cors.{field} is not a valid header value")]
    InvalidHeaderValue { field: &'static str },

    #[error("listener.tls requires both cert_path and key_path")]
    IncompleteTls,

    #[error("unknown observability.log_format {0:?} (expected \"pretty\" or \"json\")")]
    UnknownLogFormat(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }

    let redirect = &config.redirect;
    for (field, value) in [
        ("redirect.entry_path", &redirect.entry_path),
        ("redirect.default_document", &redirect.default_document),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }
    if redirect.entry_path == "/" || redirect.entry_path == redirect.default_document {
        errors.push(ValidationError::RedirectLoop(redirect.entry_path.clone()));
    }

    let prefix = &config.static_assets.prefix;
    if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
        errors.push(ValidationError::InvalidStaticPrefix(prefix.clone()));
    }

    let cors = &config.cors;
    let required = [
        ("allow_origin", Some(&cors.allow_origin)),
        ("allow_methods", Some(&cors.allow_methods)),
        ("allow_headers", Some(&cors.allow_headers)),
        ("strict_transport_security", cors.strict_transport_security.as_ref()),
        ("content_security_policy", cors.content_security_policy.as_ref()),
        ("x_content_type_options", cors.x_content_type_options.as_ref()),
        ("x_frame_options", cors.x_frame_options.as_ref()),
        ("x_xss_protection", cors.x_xss_protection.as_ref()),
        ("referrer_policy", cors.referrer_policy.as_ref()),
    ];
    for (field, value) in required {
        if let Some(value) = value {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidHeaderValue { field });
            }
        }
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(
            observability.log_format.clone(),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
