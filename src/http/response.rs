//! Locally generated responses.
//!
//! CORS and security headers are not set here; the CORS layer adds them to
//! every response on the way out.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::assets::StaticAsset;

/// Answer to a CORS preflight: 204 with an empty body.
pub fn preflight() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Serve a bundled asset. `HEAD` gets the same headers and no body.
pub fn static_asset(asset: &StaticAsset, cache_control: &HeaderValue, is_head: bool) -> Response {
    let body = if is_head {
        Body::empty()
    } else {
        Body::from(asset.content.clone())
    };

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, asset.content_type.clone());
    headers.insert(header::CACHE_CONTROL, cache_control.clone());
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(asset.content.len()));
    response
}

/// 301 to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            (StatusCode::BAD_REQUEST, "Bad request").into_response()
        }
    }
}
