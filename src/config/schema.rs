//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file (or no file) is a valid config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Public listener (bind address, TLS).
    pub listener: ListenerConfig,

    /// The single upstream application server.
    pub upstream: UpstreamConfig,

    /// Trust boundary for `X-Forwarded-*` and edge client-IP headers.
    pub forwarding: ForwardingConfig,

    /// Entry redirect and HTTPS enforcement.
    pub redirect: RedirectConfig,

    /// Bundled static assets.
    pub static_assets: StaticAssetsConfig,

    /// CORS and security headers applied to every response.
    pub cors: CorsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration. When set the public scheme is `https`.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Upstream application server coordinates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream host, normally a loopback address.
    pub host: String,

    /// Upstream port.
    pub port: u16,

    /// Speak TLS to the upstream (`https`/`wss`).
    pub tls: bool,

    /// TCP connect timeout applied by the connector, if any.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            tls: false,
            connect_timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    /// HTTP scheme used on the wire to the upstream.
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// WebSocket scheme matching [`scheme`](Self::scheme), used for logging.
    pub fn ws_scheme(&self) -> &'static str {
        if self.tls {
            "wss"
        } else {
            "ws"
        }
    }

    /// `host:port`, bracketing bare IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `scheme://host:port` with no trailing slash.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme(), self.authority())
    }
}

/// Trust boundary for client metadata supplied by a front-end proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Believe inbound `X-Forwarded-Proto`, `X-Forwarded-Host`,
    /// `X-Forwarded-For` and `client_ip_header`. Only enable this when the
    /// gateway sits behind a trusted edge layer.
    pub trust_forwarded_headers: bool,

    /// Edge-supplied client IP header consulted first when trusted.
    pub client_ip_header: String,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: false,
            client_ip_header: "cf-connecting-ip".to_string(),
        }
    }
}

/// Redirect rules evaluated before proxying.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Canonical in-app entry path the site root redirects to.
    pub entry_path: String,

    /// Default document path that redirects like the root.
    pub default_document: String,

    /// Redirect plain HTTP requests to HTTPS.
    pub enforce_https: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            entry_path: "/static/index.html".to_string(),
            default_document: "/index.html".to_string(),
            enforce_https: false,
        }
    }
}

/// Static bundle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticAssetsConfig {
    /// Reserved path prefix served from the bundle (must start and end with `/`).
    pub prefix: String,

    /// Optional directory loaded at startup on top of the built-in bundle.
    pub bundle_dir: Option<PathBuf>,

    /// `Cache-Control` sent with every asset.
    pub cache_control: String,
}

impl Default for StaticAssetsConfig {
    fn default() -> Self {
        Self {
            prefix: "/static/".to_string(),
            bundle_dir: None,
            cache_control: "public, max-age=3600".to_string(),
        }
    }
}

/// CORS and security header values.
///
/// `None` omits the header entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub strict_transport_security: Option<String>,
    pub content_security_policy: Option<String>,
    pub x_content_type_options: Option<String>,
    pub x_frame_options: Option<String>,
    pub x_xss_protection: Option<String>,
    pub referrer_policy: Option<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "*".to_string(),
            strict_transport_security: None,
            content_security_policy: None,
            x_content_type_options: Some("nosniff".to_string()),
            x_frame_options: Some("DENY".to_string()),
            x_xss_protection: Some("1; mode=block".to_string()),
            referrer_policy: Some("same-origin".to_string()),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive (overridden by `RUST_LOG`).
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
