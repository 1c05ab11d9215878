//! CORS and security header policy.
//!
//! The policy is compiled once from [`CorsConfig`] into validated header
//! pairs and shared read-only by every request. [`apply_cors_layer`] runs
//! after every handler so no response leaves without the full set.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, header::InvalidHeaderValue, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::CorsConfig;

/// Process-wide CORS and security header set.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    headers: Vec<(HeaderName, HeaderValue)>,
    /// Canonical capitalisation of each header, for rendering.
    labels: Vec<&'static str>,
}

impl CorsPolicy {
    /// Compile the policy. Optional headers set to `None` are omitted.
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        let entries = [
            ("Access-Control-Allow-Origin", header::ACCESS_CONTROL_ALLOW_ORIGIN, Some(&config.allow_origin)),
            ("Access-Control-Allow-Methods", header::ACCESS_CONTROL_ALLOW_METHODS, Some(&config.allow_methods)),
            ("Access-Control-Allow-Headers", header::ACCESS_CONTROL_ALLOW_HEADERS, Some(&config.allow_headers)),
            ("Strict-Transport-Security", header::STRICT_TRANSPORT_SECURITY, config.strict_transport_security.as_ref()),
            ("Content-Security-Policy", header::CONTENT_SECURITY_POLICY, config.content_security_policy.as_ref()),
            ("X-Content-Type-Options", header::X_CONTENT_TYPE_OPTIONS, config.x_content_type_options.as_ref()),
            ("X-Frame-Options", header::X_FRAME_OPTIONS, config.x_frame_options.as_ref()),
            ("X-XSS-Protection", header::X_XSS_PROTECTION, config.x_xss_protection.as_ref()),
            ("Referrer-Policy", header::REFERRER_POLICY, config.referrer_policy.as_ref()),
        ];

        let mut headers = Vec::with_capacity(entries.len());
        let mut labels = Vec::with_capacity(entries.len());
        for (label, name, value) in entries {
            if let Some(value) = value {
                headers.push((name, HeaderValue::from_str(value)?));
                labels.push(label);
            }
        }
        Ok(Self { headers, labels })
    }

    /// The compiled header pairs, in emission order.
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Set every policy header, replacing any value already present.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }

    /// Render the policy in the static-host `_headers` file format.
    pub fn render_headers_file(&self) -> String {
        let mut out = String::from("/*\n");
        for ((_, value), label) in self.headers.iter().zip(&self.labels) {
            if let Ok(value) = value.to_str() {
                out.push_str("  ");
                out.push_str(label);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }
}

/// Middleware applying the policy to every response.
pub async fn apply_cors_layer(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}
