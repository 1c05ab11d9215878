//! Redirect policy.
//!
//! Two independent rules, both evaluated before proxying:
//! - HTTPS enforcement: plain-HTTP public scheme → same URL on `https`
//! - Entry redirect: root or default document → canonical entry path

use axum::http::Uri;

use crate::config::RedirectConfig;
use crate::http::request::{ClientMeta, PublicScheme};
use crate::routing::matcher::{AnyMatcher, ExactPathMatcher, Matcher};

/// Why a redirect was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    HttpsUpgrade,
    Entry,
}

/// A short-circuit 301 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub reason: RedirectReason,
}

#[derive(Debug)]
pub struct RedirectPolicy {
    entry_sources: AnyMatcher,
    entry_path: String,
    enforce_https: bool,
}

impl RedirectPolicy {
    pub fn from_config(config: &RedirectConfig) -> Self {
        Self {
            entry_sources: AnyMatcher::new(vec![
                Box::new(ExactPathMatcher::new("/")),
                Box::new(ExactPathMatcher::new(config.default_document.as_str())),
            ]),
            entry_path: config.entry_path.clone(),
            enforce_https: config.enforce_https,
        }
    }

    /// The redirect for this request, if any rule applies.
    ///
    /// HTTPS enforcement is checked first so the entry redirect is issued
    /// on the upgraded origin.
    pub fn evaluate(&self, uri: &Uri, meta: &ClientMeta) -> Option<Redirect> {
        if self.enforce_https && meta.scheme == PublicScheme::Http {
            match &meta.host {
                Some(host) => {
                    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
                    return Some(Redirect {
                        location: format!("https://{host}{path_and_query}"),
                        reason: RedirectReason::HttpsUpgrade,
                    });
                }
                None => {
                    tracing::debug!(path = %uri.path(), "No host for HTTPS redirect, skipping");
                }
            }
        }

        if self.entry_sources.matches(uri.path()) {
            let location = match uri.query() {
                Some(query) => format!("{}?{}", self.entry_path, query),
                None => self.entry_path.clone(),
            };
            return Some(Redirect {
                location,
                reason: RedirectReason::Entry,
            });
        }

        None
    }
}
