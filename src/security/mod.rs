//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (Host override, X-Forwarded-*, hop-by-hop strip)
//!     → Forward to upstream
//!
//! Outgoing response:
//!     → headers.rs (Location rewrite onto the public origin)
//!     → cors.rs (CORS + security headers, on every response)
//! ```
//!
//! # Design Decisions
//! - The CORS layer wraps the whole router so no code path can skip it
//! - Forwarded client metadata is only trusted behind a known edge layer
//! - The upstream address never reaches the client

pub mod cors;
pub mod headers;

pub use cors::{apply_cors_layer, CorsPolicy};
