//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate listener and upstream addresses
//! - Check prefix, version segment and credential header shapes
//! - Detect duplicate and shadowed route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Shadowing is reported separately as a warning; routing order is a
//!   documented contract, so an earlier broad prefix is legal

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::{CredentialConfig, ProviderConfig, ProxyConfig};
use crate::security::headers::is_hop_by_hop;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("provider `{provider}`: prefix `{prefix}` must start with `/`, be non-empty and have no trailing `/`")]
    Prefix { provider: String, prefix: String },

    #[error("provider `{provider}`: prefix `{prefix}` is already used by an earlier provider")]
    DuplicatePrefix { provider: String, prefix: String },

    #[error("provider `{provider}`: upstream_base `{base}` is invalid: {reason}")]
    UpstreamBase {
        provider: String,
        base: String,
        reason: String,
    },

    #[error("provider `{provider}`: version_segment `{segment}` must start with `/`, be non-empty and have no trailing `/`")]
    VersionSegment { provider: String, segment: String },

    #[error("provider `{provider}`: credential header `{header}` is not usable")]
    CredentialHeader { provider: String, header: String },
}

/// A provider whose prefix can never match because an earlier one claims it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    pub provider: String,
    pub shadowed_by: String,
}

/// Validate a configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for provider in &config.providers {
        validate_provider(provider, &mut errors);
        if !seen.insert(provider.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix {
                provider: provider.name.clone(),
                prefix: provider.prefix.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_provider(provider: &ProviderConfig, errors: &mut Vec<ValidationError>) {
    if !is_path_segment(&provider.prefix) {
        errors.push(ValidationError::Prefix {
            provider: provider.name.clone(),
            prefix: provider.prefix.clone(),
        });
    }

    if let Err(reason) = check_upstream_base(&provider.upstream_base) {
        errors.push(ValidationError::UpstreamBase {
            provider: provider.name.clone(),
            base: provider.upstream_base.clone(),
            reason,
        });
    }

    if let Some(segment) = &provider.version_segment {
        if !is_path_segment(segment) {
            errors.push(ValidationError::VersionSegment {
                provider: provider.name.clone(),
                segment: segment.clone(),
            });
        }
    }

    if let CredentialConfig::Header { name } = &provider.credential {
        let usable = HeaderName::from_bytes(name.as_bytes())
            .map(|h| !is_hop_by_hop(h.as_str()))
            .unwrap_or(false);
        if !usable {
            errors.push(ValidationError::CredentialHeader {
                provider: provider.name.clone(),
                header: name.clone(),
            });
        }
    }
}

/// `/x`, `/x/y`: leading slash, something after it, no trailing slash.
fn is_path_segment(value: &str) -> bool {
    value.len() > 1 && value.starts_with('/') && !value.ends_with('/')
}

fn check_upstream_base(base: &str) -> Result<(), String> {
    let url = Url::parse(base).map_err(|e| e.to_string())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

/// Find providers hidden (fully or partly) behind an earlier, broader prefix.
pub fn shadowed_routes(providers: &[ProviderConfig]) -> Vec<Shadowed> {
    let mut out = Vec::new();
    for (i, later) in providers.iter().enumerate() {
        if let Some(earlier) = providers[..i]
            .iter()
            .find(|p| p.prefix != later.prefix && later.prefix.starts_with(&p.prefix))
        {
            out.push(Shadowed {
                provider: later.name.clone(),
                shadowed_by: earlier.name.clone(),
            });
        }
    }
    out
}
