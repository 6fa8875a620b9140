//! Compiled route table.
//!
//! # Responsibilities
//! - Turn validated `ProviderConfig`s into immutable `RouteEntry`s
//! - Preserve declaration order (it is the routing order)
//! - Hold each provider's API key without ever printing it

use axum::http::HeaderName;

use crate::config::{CredentialConfig, ProviderConfig, Secret};
use crate::routing::matcher::PathPrefixMatcher;

/// Which outgoing header carries the provider's API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// `Authorization: Bearer <key>`.
    BearerHeader,
    /// `<name>: <key>`; the client's `Authorization` header is dropped.
    CustomHeader(HeaderName),
}

/// Errors raised while compiling the route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("duplicate route prefix `{0}`")]
    DuplicatePrefix(String),

    #[error("invalid credential header `{header}` for provider `{provider}`")]
    InvalidHeader { provider: String, header: String },
}

/// One upstream provider reachable under a path prefix.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    name: String,
    matcher: PathPrefixMatcher,
    upstream_base: String,
    version_segment: Option<String>,
    credential: CredentialStrategy,
    api_key: Option<Secret>,
}

impl RouteEntry {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        upstream_base: impl Into<String>,
        version_segment: Option<String>,
        credential: CredentialStrategy,
        api_key: Option<Secret>,
    ) -> Self {
        let upstream_base = upstream_base.into();
        Self {
            name: name.into(),
            matcher: PathPrefixMatcher::new(prefix),
            upstream_base: upstream_base.trim_end_matches('/').to_string(),
            version_segment: version_segment.filter(|s| !s.is_empty()),
            credential,
            api_key,
        }
    }

    fn from_config(config: &ProviderConfig) -> Result<Self, RouteTableError> {
        let credential = match &config.credential {
            CredentialConfig::Bearer => CredentialStrategy::BearerHeader,
            CredentialConfig::Header { name } => HeaderName::from_bytes(name.as_bytes())
                .map(CredentialStrategy::CustomHeader)
                .map_err(|_| RouteTableError::InvalidHeader {
                    provider: config.name.clone(),
                    header: name.clone(),
                })?,
        };
        Ok(Self::new(
            config.name.clone(),
            config.prefix.clone(),
            config.upstream_base.clone(),
            config.version_segment.clone(),
            credential,
            config.api_key.clone(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn matcher(&self) -> &PathPrefixMatcher {
        &self.matcher
    }

    /// Upstream base URL, never with a trailing slash.
    pub fn upstream_base(&self) -> &str {
        &self.upstream_base
    }

    pub fn version_segment(&self) -> Option<&str> {
        self.version_segment.as_deref()
    }

    pub fn credential(&self) -> &CredentialStrategy {
        &self.credential
    }

    pub fn api_key(&self) -> Option<&Secret> {
        self.api_key.as_ref()
    }
}

/// Ordered, immutable list of routes. Shared via `Arc` after startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build a table, rejecting duplicate prefixes. Order is kept as given.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteTableError> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.prefix() == entry.prefix()) {
                return Err(RouteTableError::DuplicatePrefix(entry.prefix().to_string()));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_config(providers: &[ProviderConfig]) -> Result<Self, RouteTableError> {
        let entries = providers
            .iter()
            .map(RouteEntry::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    /// Entries in routing order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
