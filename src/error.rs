//! Gateway error types.
//!
//! Request-path failures are [`GatewayError`]s. They render as a plain-text
//! 500 with a fixed message: the upstream address, internal hostnames and
//! error chains go to the log, never into the body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;

/// Failures while handling one request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection to the upstream could not be established or broke before
    /// response headers arrived.
    #[error("upstream request failed: {0}")]
    UpstreamUnreachable(#[source] hyper_util::client::legacy::Error),

    /// The upstream target URI could not be built from the request.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[from] axum::http::uri::InvalidUri),

    /// A request or response could not be assembled.
    #[error("failed to build message: {0}")]
    Build(#[from] axum::http::Error),
}

impl GatewayError {
    /// The message shown to clients.
    pub fn client_message(&self) -> &'static str {
        match self {
            GatewayError::UpstreamUnreachable(e) if e.is_connect() => {
                "Error: upstream service is unavailable (connection failed)"
            }
            GatewayError::UpstreamUnreachable(_) => {
                "Error: upstream service closed the connection unexpectedly"
            }
            GatewayError::InvalidTarget(_) | GatewayError::Build(_) => {
                "Error: request could not be forwarded"
            }
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UpstreamUnreachable(e) if e.is_connect() => "connect",
            GatewayError::UpstreamUnreachable(_) => "upstream",
            GatewayError::InvalidTarget(_) => "target",
            GatewayError::Build(_) => "build",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.client_message(),
        )
            .into_response()
    }
}

/// Failures while starting the gateway.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid CORS policy: {0}")]
    Policy(#[from] axum::http::header::InvalidHeaderValue),

    #[error("failed to load static bundle: {0}")]
    Assets(#[from] AssetError),

    #[error("failed to initialise upstream client: {0}")]
    Client(#[source] std::io::Error),

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] std::io::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
