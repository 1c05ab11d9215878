//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Public listener
//!     → tls.rs (optional TLS termination)
//!     → Hand off to HTTP layer
//!
//! Upgraded connections (after both 101s):
//!     client ⇄ splice.rs ⇄ upstream
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Spliced bytes are never interpreted

pub mod splice;
pub mod tls;

pub use splice::{splice, Side, SpliceStats};
