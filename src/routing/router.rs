//! Route lookup.
//!
//! # Responsibilities
//! - Hold the compiled route table
//! - Look up the route for a request path
//! - Return the matched entry or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First match in declaration order wins, not the longest prefix. A broad
//!   prefix listed early hides narrower ones listed later; the config loader
//!   warns about that case
//! - O(n) prefix scan over an ordered list (acceptable for typical route counts)

use std::sync::Arc;

use crate::routing::matcher::Matcher;
use crate::routing::table::{RouteEntry, RouteTable};

/// Resolves request paths to route entries.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    /// First entry, in declaration order, whose prefix the path starts with.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.table
            .entries()
            .iter()
            .find(|entry| entry.matcher().matches(path))
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}
