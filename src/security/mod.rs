//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (shared-secret gate, before any routing)
//!     → [routing + rewrite]
//!     → headers.rs (strip hop-by-hop / CDN / forwarded, inject credential)
//!     → Pass to forwarder
//! ```
//!
//! # Design Decisions
//! - Fail closed: a wrong or missing shared secret is a 401, no upstream call
//! - No trust in client input: client credentials never reach the upstream
//! - Credentials are marked sensitive and never logged

pub mod auth;
pub mod headers;

pub use auth::{AuthDecision, AuthGate};
pub use headers::HeaderSanitizer;
