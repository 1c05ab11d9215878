//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, CORS/trace/request-id layers)
//!     → request.rs (request ID, client metadata)
//!     → [routing layer classifies the request]
//!     → response.rs (preflight, static, redirect)
//!       | proxy.rs (plain forwarding via client.rs)
//!       | websocket.rs (handshake relay, then splice)
//!     → Send to client
//! ```

pub mod client;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{ClientMeta, PublicScheme, X_REQUEST_ID};
pub use server::{GatewayServer, GatewayState};
