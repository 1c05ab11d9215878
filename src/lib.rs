//! Edge gateway library.
//!
//! A reverse proxy that sits in front of a single upstream application
//! server: it answers preflights, serves a preloaded static bundle, issues
//! entry and HTTPS redirects, forwards everything else (WebSocket upgrades
//! included) and stamps a fixed CORS and security header set on every
//! response.

pub mod assets;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::{GatewayError, StartupError};
pub use http::GatewayServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
