//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate prefix)
//!     → Return: matched RouteEntry or NoMatch
//!     → rewrite.rs (strip prefix, inject version, join with upstream base)
//!
//! Route Compilation (at startup):
//!     ProviderConfig[]
//!     → table.rs (RouteEntry per provider, order preserved)
//!     → Freeze as immutable RouteTable behind Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by declaration)

pub mod matcher;
pub mod rewrite;
pub mod router;
pub mod table;

pub use rewrite::PathRewriter;
pub use router::Router;
pub use table::{CredentialStrategy, RouteEntry, RouteTable, RouteTableError};
