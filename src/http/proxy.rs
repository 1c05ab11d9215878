//! Plain HTTP forwarding to the upstream.
//!
//! # Responsibilities
//! - Re-target the request at the fixed upstream origin
//! - Transform headers in both directions
//! - Stream request and response bodies
//!
//! # Design Decisions
//! - GET and HEAD never carry a body upstream
//! - Outbound requests are always HTTP/1.1
//! - No retries: a failure is reported to the caller once

use axum::{
    body::Body,
    http::{header, Method, Request, Uri, Version},
    response::Response,
};

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::http::request::ClientMeta;
use crate::http::server::GatewayState;
use crate::security::headers::{forward_request_headers, rewrite_location_headers, strip_hop_by_hop};

/// Forward `request` to the upstream and relay its response.
pub async fn forward(
    state: &GatewayState,
    request: Request<Body>,
    meta: &ClientMeta,
) -> Result<Response, GatewayError> {
    let upstream = &state.config.upstream;
    let (mut parts, body) = request.into_parts();
    let uri = upstream_uri(upstream, &parts.uri)?;

    forward_request_headers(&mut parts.headers, meta, upstream);
    strip_hop_by_hop(&mut parts.headers);

    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        parts.headers.remove(header::CONTENT_LENGTH);
        Body::empty()
    } else {
        body
    };

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri.clone())
        .version(Version::HTTP_11)
        .body(body)?;
    *outbound.headers_mut() = parts.headers;

    let response = state
        .client
        .request(outbound)
        .await
        .map_err(GatewayError::UpstreamUnreachable)?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    let public_origin = meta.public_origin();
    rewrite_location_headers(&mut parts.headers, upstream, &uri, public_origin.as_deref());

    Ok(Response::from_parts(parts, Body::new(body)))
}

/// `<scheme>://<host>:<port><path>?<query>` on the upstream.
pub fn upstream_uri(upstream: &UpstreamConfig, uri: &Uri) -> Result<Uri, GatewayError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let target = format!("{}://{}{}", upstream.scheme(), upstream.authority(), path_and_query);
    Ok(target.parse()?)
}
