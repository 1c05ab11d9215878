//! Bundled static assets.
//!
//! # Responsibilities
//! - Build the in-memory asset table once at startup
//! - Resolve a request path to an asset by exact match
//!
//! # Design Decisions
//! - No filesystem access per request; the bundle is preloaded
//! - Asset bytes are `Bytes`, so responses share them without copying
//! - A miss is not an error: the dispatcher falls through to the upstream

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use bytes::Bytes;
use thiserror::Error;

use crate::config::StaticAssetsConfig;
use crate::security::CorsPolicy;

const INDEX_HTML: &str = include_str!("bundle/index.html");
const CLIENT_JS: &[u8] = include_bytes!("bundle/gateway-client.js");

/// Failure while loading a bundle directory at startup.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read bundle entry {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bundle entry {0:?} has a non UTF-8 name")]
    InvalidName(PathBuf),
}

/// A preloaded asset.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    /// Request path the asset is served at.
    pub path: String,
    pub content: Bytes,
    pub content_type: HeaderValue,
}

/// Immutable path → asset table.
#[derive(Debug, Clone)]
pub struct AssetTable {
    prefix: String,
    assets: HashMap<String, StaticAsset>,
}

impl AssetTable {
    /// An empty table serving under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            assets: HashMap::new(),
        }
    }

    /// The built-in bundle: entry page, client script and `_headers` file.
    pub fn builtin(prefix: impl Into<String>, policy: &CorsPolicy) -> Self {
        let mut table = Self::new(prefix);
        let index = INDEX_HTML.replace("{{static_prefix}}", &table.prefix);
        table.insert("index.html", index);
        table.insert("gateway-client.js", Bytes::from_static(CLIENT_JS));
        table.insert_with_type(
            "_headers",
            policy.render_headers_file(),
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        table
    }

    /// Built-in bundle overlaid with the configured bundle directory.
    pub fn load(config: &StaticAssetsConfig, policy: &CorsPolicy) -> Result<Self, AssetError> {
        let mut table = Self::builtin(config.prefix.as_str(), policy);
        if let Some(dir) = &config.bundle_dir {
            let loaded = table.load_dir(dir, dir)?;
            tracing::info!(dir = ?dir, assets = loaded, "Loaded static bundle directory");
        }
        Ok(table)
    }

    /// Insert an asset at `<prefix><relative>`, guessing its content type.
    pub fn insert(&mut self, relative: &str, content: impl Into<Bytes>) {
        let content_type = guess_content_type(relative);
        self.insert_with_type(relative, content, content_type);
    }

    pub fn insert_with_type(
        &mut self,
        relative: &str,
        content: impl Into<Bytes>,
        content_type: HeaderValue,
    ) {
        let path = format!("{}{}", self.prefix, relative.trim_start_matches('/'));
        self.assets.insert(
            path.clone(),
            StaticAsset {
                path,
                content: content.into(),
                content_type,
            },
        );
    }

    /// Reserved prefix this table serves under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Exact-match lookup.
    pub fn resolve(&self, path: &str) -> Option<&StaticAsset> {
        self.assets.get(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn load_dir(&mut self, root: &Path, dir: &Path) -> Result<usize, AssetError> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir).map_err(read_error(dir))? {
            let entry = entry.map_err(read_error(dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(read_error(&path))?;

            if file_type.is_dir() {
                loaded += self.load_dir(root, &path)?;
            } else if file_type.is_file() {
                let relative = relative_key(root, &path)?;
                let content = std::fs::read(&path).map_err(read_error(&path))?;
                tracing::debug!(asset = %relative, bytes = content.len(), "Loaded asset");
                self.insert(&relative, content);
                loaded += 1;
            }
        }
        Ok(loaded)
    }
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> AssetError + '_ {
    move |source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn relative_key(root: &Path, path: &Path) -> Result<String, AssetError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| AssetError::InvalidName(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn guess_content_type(path: &str) -> HeaderValue {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let value = if mime.type_().as_str() == "text" && mime.get_param("charset").is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    };
    HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("application/octet-stream"))
}
