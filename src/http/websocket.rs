//! WebSocket upgrade forwarding.
//!
//! # Data Flow
//! ```text
//! Client ──handshake──→ Gateway ──handshake──→ Upstream
//! Client ←────101───── Gateway ←────101────── Upstream
//! Client ⇄═══════ splice (raw bytes) ═══════⇄ Upstream
//! ```
//!
//! # Design Decisions
//! - The handshake is forwarded, not terminated: `Sec-WebSocket-*`,
//!   `Upgrade` and `Connection` pass through verbatim
//! - A non-101 upstream answer is relayed as-is
//! - Frames are never parsed; close frames travel like any other bytes

use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode, Version},
    response::Response,
};
use hyper_util::rt::TokioIo;

use crate::error::GatewayError;
use crate::http::proxy::upstream_uri;
use crate::http::request::{request_id, ClientMeta};
use crate::http::server::GatewayState;
use crate::net::splice;
use crate::observability::metrics::SpliceGauge;
use crate::security::headers::upstream_handshake_headers;

/// Relay an upgrade handshake and, on success, splice both connections.
pub async fn forward_upgrade(
    state: &GatewayState,
    mut request: Request<Body>,
    meta: &ClientMeta,
) -> Result<Response, GatewayError> {
    let upstream = &state.config.upstream;
    let client_upgrade = hyper::upgrade::on(&mut request);
    let (mut parts, _body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_owned();
    let uri = upstream_uri(upstream, &parts.uri)?;

    tracing::debug!(
        request_id = %request_id,
        scheme = upstream.ws_scheme(),
        path = %uri.path(),
        "Forwarding upgrade handshake"
    );

    upstream_handshake_headers(&mut parts.headers, meta, upstream);
    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri)
        .version(Version::HTTP_11)
        .body(Body::empty())?;
    *outbound.headers_mut() = parts.headers;

    let mut upstream_response = state
        .client
        .request(outbound)
        .await
        .map_err(GatewayError::UpstreamUnreachable)?;

    if upstream_response.status() != StatusCode::SWITCHING_PROTOCOLS {
        tracing::info!(
            request_id = %request_id,
            status = %upstream_response.status(),
            "Upstream declined upgrade"
        );
        let (parts, body) = upstream_response.into_parts();
        return Ok(Response::from_parts(parts, Body::new(body)));
    }

    let upstream_upgrade = hyper::upgrade::on(&mut upstream_response);

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    *response.headers_mut() = upstream_response.headers().clone();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("upgrade"));

    tokio::spawn(async move {
        let (client_io, upstream_io) = match tokio::try_join!(client_upgrade, upstream_upgrade) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Upgrade failed after handshake");
                return;
            }
        };

        let _gauge = SpliceGauge::start();
        let started = Instant::now();
        let stats = splice(TokioIo::new(client_io), TokioIo::new(upstream_io)).await;

        tracing::info!(
            request_id = %request_id,
            client_to_upstream = stats.client_to_upstream,
            upstream_to_client = stats.upstream_to_client,
            closed_by = %stats.closed_by,
            duration_ms = started.elapsed().as_millis() as u64,
            error = ?stats.error,
            "Splice ended"
        );
    });

    Ok(response)
}
