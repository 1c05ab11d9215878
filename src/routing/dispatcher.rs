//! Per-request dispatch decision.
//!
//! # Responsibilities
//! - Classify a request as preflight, upgrade, static, redirect or proxy
//! - Return the matched asset or redirect with the decision
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First match wins, in a fixed order
//! - A static-prefix miss skips the redirect rules and goes to the upstream

use axum::http::{Method, Uri};

use crate::assets::{AssetTable, StaticAsset};
use crate::http::request::ClientMeta;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};
use crate::routing::redirect::{Redirect, RedirectPolicy};

/// What to do with a request.
#[derive(Debug)]
pub enum Dispatch<'a> {
    /// CORS preflight, answered locally.
    Preflight,
    /// Protocol upgrade, relayed to the upstream.
    Upgrade,
    /// Bundled asset hit.
    Static(&'a StaticAsset),
    /// Local redirect.
    Redirect(Redirect),
    /// Forward to the upstream.
    Proxy,
}

impl Dispatch<'_> {
    /// Low-cardinality label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Dispatch::Preflight => "preflight",
            Dispatch::Upgrade => "upgrade",
            Dispatch::Static(_) => "static",
            Dispatch::Redirect(_) => "redirect",
            Dispatch::Proxy => "proxy",
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    assets: AssetTable,
    static_prefix: PathPrefixMatcher,
    redirects: RedirectPolicy,
}

impl Dispatcher {
    pub fn new(assets: AssetTable, redirects: RedirectPolicy) -> Self {
        let static_prefix = PathPrefixMatcher::new(assets.prefix());
        Self {
            assets,
            static_prefix,
            redirects,
        }
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// Decide how to handle a request.
    pub fn classify(&self, method: &Method, uri: &Uri, meta: &ClientMeta) -> Dispatch<'_> {
        if *method == Method::OPTIONS {
            return Dispatch::Preflight;
        }
        if meta.is_upgrade {
            return Dispatch::Upgrade;
        }

        let path = uri.path();
        if self.static_prefix.matches(path) {
            return match self.assets.resolve(path) {
                Some(asset) => Dispatch::Static(asset),
                None => {
                    tracing::debug!(path = %path, "Static asset miss, forwarding upstream");
                    Dispatch::Proxy
                }
            };
        }

        match self.redirects.evaluate(uri, meta) {
            Some(redirect) => Dispatch::Redirect(redirect),
            None => Dispatch::Proxy,
        }
    }
}
