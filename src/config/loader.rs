//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::secret::Secret;
use crate::config::validation::{shadowed_routes, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let mut config: ProxyConfig = toml::from_str(content)?;
    normalize(&mut config);
    config.validate()?;
    Ok(config)
}

fn normalize(config: &mut ProxyConfig) {
    for provider in &mut config.providers {
        let trimmed = provider.upstream_base.trim_end_matches('/').len();
        provider.upstream_base.truncate(trimmed);
    }
}

impl ProxyConfig {
    /// Re-run validation, e.g. after a command-line override.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_config(self).map_err(ConfigError::Validation)
    }

    /// Log a warning for every provider an earlier prefix makes unreachable.
    pub fn warn_shadowed_routes(&self) {
        for shadow in shadowed_routes(&self.providers) {
            tracing::warn!(
                provider = %shadow.provider,
                shadowed_by = %shadow.shadowed_by,
                "Provider prefix is hidden by an earlier provider; first match wins"
            );
        }
    }

    /// Fill every credential not set inline from the environment.
    ///
    /// `lookup` maps a variable name to its value; empty values count as
    /// unset. Missing credentials are not an error here: a provider without a
    /// key fails only when a request is routed to it.
    pub fn resolve_secrets<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(Secret::new);

        if self.auth.shared_secret.as_ref().map_or(true, Secret::is_empty) {
            self.auth.shared_secret = fetch(&self.auth.shared_secret_env);
        }
        for provider in &mut self.providers {
            if provider.api_key.as_ref().map_or(true, Secret::is_empty) {
                provider.api_key = fetch(&provider.api_key_env);
                if provider.api_key.is_none() {
                    tracing::warn!(
                        provider = %provider.name,
                        env = %provider.api_key_env,
                        "API key not configured; requests to this provider will fail"
                    );
                }
            }
        }
    }

    /// Fill credentials from the process environment.
    pub fn resolve_secrets_from_env(&mut self) {
        self.resolve_secrets(|name| std::env::var(name).ok());
    }
}
