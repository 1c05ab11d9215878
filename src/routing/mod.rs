//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, client meta)
//!     → dispatcher.rs (ordered decision)
//!     → matcher.rs (evaluate path conditions)
//!     → redirect.rs (entry redirect, HTTPS enforcement)
//!     → Return: Preflight | Upgrade | Static | Redirect | Proxy
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix and exact matching only)
//! - Deterministic: same input always yields the same decision
//! - First match wins

pub mod dispatcher;
pub mod matcher;
pub mod redirect;

pub use dispatcher::{Dispatch, Dispatcher};
pub use redirect::{Redirect, RedirectPolicy, RedirectReason};
