//! Header transformation between client and upstream.
//!
//! # Responsibilities
//! - Set Host, X-Forwarded-For, X-Real-IP, X-Forwarded-Proto on the way in
//! - Override Host and Origin for WebSocket handshakes
//! - Strip hop-by-hop headers
//! - Rewrite Location headers back onto the public origin
//!
//! # Design Decisions
//! - Headers are an `HeaderMap` multimap: `insert` sets, `append` adds,
//!   `remove` drops all values for a name
//! - Forwarded values are derived once in [`ClientMeta`] under the
//!   configured trust boundary, never read here
//! - Locations pointing at foreign hosts are left untouched

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::request::{ClientMeta, X_FORWARDED_FOR, X_FORWARDED_PROTO, X_REAL_IP};

/// Hop-by-hop headers never relayed on plain request/response paths.
/// `Connection` and `Upgrade` are kept for upgrade handshakes by callers.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Headers that may carry an absolute URL into the upstream.
const LOCATION_HEADERS: [HeaderName; 2] = [header::LOCATION, header::CONTENT_LOCATION];

/// Apply the inbound→outbound transformation to request headers.
///
/// Everything not named here passes through unmodified.
pub fn forward_request_headers(
    headers: &mut HeaderMap,
    meta: &ClientMeta,
    upstream: &UpstreamConfig,
) {
    if let Ok(host) = HeaderValue::from_str(&upstream.authority()) {
        headers.insert(header::HOST, host);
    }
    headers.insert(
        X_FORWARDED_PROTO,
        HeaderValue::from_static(meta.scheme.as_str()),
    );
    if let Ok(client) = HeaderValue::from_str(&meta.client_addr) {
        headers.insert(X_FORWARDED_FOR, client.clone());
        headers.insert(X_REAL_IP, client);
    }
}

/// Transformation for an upstream WebSocket handshake.
///
/// Same as [`forward_request_headers`], plus `Origin` set to the upstream's
/// own origin so it sees itself as the addressee. `Upgrade`, `Connection`
/// and every `Sec-WebSocket-*` header stay verbatim.
pub fn upstream_handshake_headers(
    headers: &mut HeaderMap,
    meta: &ClientMeta,
    upstream: &UpstreamConfig,
) {
    forward_request_headers(headers, meta, upstream);
    if let Ok(origin) = HeaderValue::from_str(&upstream.origin()) {
        headers.insert(header::ORIGIN, origin);
    }
}

/// Remove hop-by-hop headers.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Rewrite every location-bearing header pointing at the upstream.
///
/// Relative references resolve against `request_target`, the URL the
/// upstream was actually asked for. With no known public origin the location
/// becomes origin-relative, which still keeps the upstream address out of the
/// response. A value that cannot be rewritten but still names the upstream is
/// dropped.
pub fn rewrite_location_headers(
    headers: &mut HeaderMap,
    upstream: &UpstreamConfig,
    request_target: &Uri,
    public_origin: Option<&str>,
) {
    let Ok(base) = Url::parse(&request_target.to_string()) else {
        return;
    };
    for name in LOCATION_HEADERS {
        let Some(location) = headers.get(&name).map(|v| escape_obs_text(v.as_bytes())) else {
            continue;
        };
        let rewritten = rewrite_location(&location, upstream, &base, public_origin)
            .and_then(|location| HeaderValue::from_str(&location).ok());
        match rewritten {
            Some(value) => {
                headers.insert(name, value);
            }
            None if mentions_upstream(&location, upstream) => {
                tracing::debug!(header = %name, "Dropping unrewritable upstream location");
                headers.remove(name);
            }
            None => {}
        }
    }
}

/// Resolve `location` against `base` and re-base it onto the public origin.
/// Returns `None` when the location targets another host.
pub fn rewrite_location(
    location: &str,
    upstream: &UpstreamConfig,
    base: &Url,
    public_origin: Option<&str>,
) -> Option<String> {
    let resolved = base.join(location).ok()?;
    if !targets_upstream(&resolved, upstream) {
        return None;
    }

    let mut rebased = public_origin
        .map(|origin| origin.trim_end_matches('/').to_owned())
        .unwrap_or_default();
    rebased.push_str(resolved.path());
    if let Some(query) = resolved.query() {
        rebased.push('?');
        rebased.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        rebased.push('#');
        rebased.push_str(fragment);
    }
    Some(rebased)
}

/// Header values may carry raw bytes above 0x7f; percent-encode them so the
/// value parses as a URL reference without losing those bytes.
fn escape_obs_text(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw {
        if byte.is_ascii() {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn mentions_upstream(location: &str, upstream: &UpstreamConfig) -> bool {
    let location = location.to_ascii_lowercase();
    if location.contains(&upstream.authority().to_ascii_lowercase()) {
        return true;
    }
    is_loopback(upstream.host.trim_start_matches('[').trim_end_matches(']'))
        && ["localhost", "127.0.0.1", "[::1]", "0.0.0.0"]
            .iter()
            .any(|alias| location.contains(&format!("{alias}:{}", upstream.port)))
}

fn targets_upstream(url: &Url, upstream: &UpstreamConfig) -> bool {
    if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
        return false;
    }
    if url.port_or_known_default() != Some(upstream.port) {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let configured = upstream.host.trim_start_matches('[').trim_end_matches(']');
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case(configured) || (is_loopback(host) && is_loopback(configured))
}

fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback() || ip.is_unspecified())
            .unwrap_or(false)
}
