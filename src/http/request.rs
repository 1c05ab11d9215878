//! Request handling and client metadata.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Derive the client address, public scheme and public host
//! - Detect protocol upgrade requests
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Forwarded metadata is only believed behind a trusted edge layer
//! - Metadata is computed once per request and passed by reference

use std::fmt;
use std::net::SocketAddr;

use axum::http::{header, request::Parts, HeaderMap, HeaderName, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::config::ForwardingConfig;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Scheme the client used to reach the public origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicScheme {
    Http,
    Https,
}

impl PublicScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicScheme::Http => "http",
            PublicScheme::Https => "https",
        }
    }

    /// Parse the first entry of an `X-Forwarded-Proto` value.
    pub fn from_forwarded(value: &str) -> Option<Self> {
        let first = value.split(',').next()?.trim();
        if first.eq_ignore_ascii_case("https") || first.eq_ignore_ascii_case("wss") {
            Some(PublicScheme::Https)
        } else if first.eq_ignore_ascii_case("http") || first.eq_ignore_ascii_case("ws") {
            Some(PublicScheme::Http)
        } else {
            None
        }
    }
}

impl fmt::Display for PublicScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request client metadata derived before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta {
    /// Original client address (IP only, no port).
    pub client_addr: String,
    /// Scheme of the public origin.
    pub scheme: PublicScheme,
    /// Host (with optional port) of the public origin, if known.
    pub host: Option<String>,
    /// The request asks for a protocol switch.
    pub is_upgrade: bool,
}

impl ClientMeta {
    /// Derive metadata from request parts and the connection.
    pub fn from_parts(
        parts: &Parts,
        peer: SocketAddr,
        listener_scheme: PublicScheme,
        forwarding: &ForwardingConfig,
    ) -> Self {
        let headers = &parts.headers;
        let trusted = forwarding.trust_forwarded_headers;

        let client_addr = trusted
            .then(|| trusted_client_addr(headers, &forwarding.client_ip_header))
            .flatten()
            .unwrap_or_else(|| peer.ip().to_string());

        let scheme = trusted
            .then(|| {
                header_str(headers, &X_FORWARDED_PROTO).and_then(PublicScheme::from_forwarded)
            })
            .flatten()
            .unwrap_or(listener_scheme);

        let forwarded_host = trusted
            .then(|| header_str(headers, &X_FORWARDED_HOST).and_then(first_entry))
            .flatten();
        let host = forwarded_host
            .or_else(|| header_str(headers, &header::HOST).map(str::to_owned))
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_owned()));

        Self {
            client_addr,
            scheme,
            host,
            is_upgrade: is_upgrade_request(headers),
        }
    }

    /// `scheme://host` of the public origin, when the host is known.
    pub fn public_origin(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("{}://{}", self.scheme, host))
    }
}

/// True when the request carries a non-empty `Upgrade` header.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    header_str(headers, &header::UPGRADE)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

fn trusted_client_addr(headers: &HeaderMap, client_ip_header: &str) -> Option<String> {
    let edge = HeaderName::from_bytes(client_ip_header.as_bytes())
        .ok()
        .and_then(|name| header_str(headers, &name).and_then(first_entry));
    edge.or_else(|| header_str(headers, &X_FORWARDED_FOR).and_then(first_entry))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn first_entry(value: &str) -> Option<String> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    fn peer() -> SocketAddr {
        "192.0.2.10:55000".parse().unwrap()
    }

    #[test]
    fn untrusted_headers_are_ignored() {
        let parts = parts(
            Request::builder()
                .uri("/app")
                .header("host", "example.com")
                .header("x-forwarded-for", "203.0.113.9")
                .header("x-forwarded-proto", "https")
                .header("cf-connecting-ip", "203.0.113.7"),
        );
        let meta = ClientMeta::from_parts(
            &parts,
            peer(),
            PublicScheme::Http,
            &ForwardingConfig::default(),
        );

        assert_eq!(meta.client_addr, "192.0.2.10");
        assert_eq!(meta.scheme, PublicScheme::Http);
        assert_eq!(meta.public_origin().as_deref(), Some("http://example.com"));
        assert!(!meta.is_upgrade);
    }

    #[test]
    fn trusted_edge_headers_win() {
        let parts = parts(
            Request::builder()
                .uri("/app")
                .header("host", "internal.lan")
                .header("x-forwarded-host", "example.com")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .header("x-forwarded-proto", "https")
                .header("cf-connecting-ip", "203.0.113.7"),
        );
        let forwarding = ForwardingConfig {
            trust_forwarded_headers: true,
            ..ForwardingConfig::default()
        };
        let meta = ClientMeta::from_parts(&parts, peer(), PublicScheme::Http, &forwarding);

        assert_eq!(meta.client_addr, "203.0.113.7");
        assert_eq!(meta.scheme, PublicScheme::Https);
        assert_eq!(meta.public_origin().as_deref(), Some("https://example.com"));
    }

    #[test]
    fn trusted_falls_back_to_forwarded_for() {
        let parts = parts(
            Request::builder()
                .uri("/")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
        );
        let forwarding = ForwardingConfig {
            trust_forwarded_headers: true,
            ..ForwardingConfig::default()
        };
        let meta = ClientMeta::from_parts(&parts, peer(), PublicScheme::Https, &forwarding);

        assert_eq!(meta.client_addr, "203.0.113.9");
        assert_eq!(meta.scheme, PublicScheme::Https);
        assert_eq!(meta.host, None);
    }

    #[test]
    fn detects_upgrade() {
        let parts = parts(
            Request::builder()
                .uri("/stream")
                .header("connection", "Upgrade")
                .header("upgrade", "websocket"),
        );
        let meta = ClientMeta::from_parts(
            &parts,
            peer(),
            PublicScheme::Http,
            &ForwardingConfig::default(),
        );
        assert!(meta.is_upgrade);
    }

    #[test]
    fn forwarded_proto_parsing() {
        assert_eq!(PublicScheme::from_forwarded("HTTPS"), Some(PublicScheme::Https));
        assert_eq!(PublicScheme::from_forwarded("http, https"), Some(PublicScheme::Http));
        assert_eq!(PublicScheme::from_forwarded("gopher"), None);
    }
}
