//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! The defaults describe the canonical provider table, so the proxy runs
//! without any config file as long as the API keys are in the environment.

use serde::{Deserialize, Serialize};

use crate::config::secret::Secret;

/// Root configuration for the inference proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream client timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream client behaviour.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Proxy-wide shared secret gate.
    pub auth: AuthConfig,

    /// Request header sanitization settings.
    pub headers: HeaderPolicyConfig,

    /// Upstream providers, in routing order. The first entry whose prefix
    /// matches the request path wins.
    pub providers: Vec<ProviderConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            upstream: UpstreamConfig::default(),
            observability: ObservabilityConfig::default(),
            auth: AuthConfig::default(),
            headers: HeaderPolicyConfig::default(),
            providers: ProviderConfig::canonical(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeouts applied to upstream calls.
///
/// No total-request timeout exists: a streamed completion runs until the
/// upstream closes it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP/TLS connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Maximum wait for upstream response headers in seconds (0 = unbounded).
    pub response_header_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            response_header_secs: 300,
        }
    }
}

/// Upstream client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Route upstream calls through `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY`
    /// when those are set.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { system_proxy: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Shared-secret gate in front of every proxied route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Environment variable holding the shared secret.
    pub shared_secret_env: String,

    /// Inline shared secret. Takes precedence over the environment.
    pub shared_secret: Option<Secret>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            shared_secret_env: "PROXY_TOKEN".to_string(),
            shared_secret: None,
        }
    }
}

/// Header sanitization policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderPolicyConfig {
    /// Header-name prefixes added by edge networks and CDNs. Matching
    /// request headers are never forwarded upstream.
    pub strip_prefixes: Vec<String>,
}

impl Default for HeaderPolicyConfig {
    fn default() -> Self {
        Self {
            strip_prefixes: [
                "cf-", "cdn-", "x-vercel-", "x-amz-cf-", "fly-", "x-nf-", "x-deno-",
                "x-railway-", "x-render-",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Which outgoing header carries a provider's API key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// `<name>: <key>`, with any client `Authorization` header removed.
    Header { name: String },
}

/// One upstream provider reachable under a path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider identifier for logging/metrics.
    pub name: String,

    /// Path prefix selecting this provider (e.g., "/claude").
    pub prefix: String,

    /// Absolute upstream base URL (e.g., "https://api.anthropic.com").
    pub upstream_base: String,

    /// Version segment injected when the caller's path lacks it.
    #[serde(default)]
    pub version_segment: Option<String>,

    /// Credential header convention.
    pub credential: CredentialConfig,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Inline API key. Takes precedence over the environment.
    #[serde(default)]
    pub api_key: Option<Secret>,
}

impl ProviderConfig {
    fn new(
        name: &str,
        upstream_base: &str,
        version_segment: Option<&str>,
        credential: CredentialConfig,
        api_key_env: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            prefix: format!("/{}", name),
            upstream_base: upstream_base.to_string(),
            version_segment: version_segment.map(String::from),
            credential,
            api_key_env: api_key_env.to_string(),
            api_key: None,
        }
    }

    /// The built-in provider table, in routing order.
    pub fn canonical() -> Vec<Self> {
        let header = |name: &str| CredentialConfig::Header {
            name: name.to_string(),
        };
        vec![
            Self::new(
                "chatgpt",
                "https://api.openai.com",
                Some("/v1"),
                CredentialConfig::Bearer,
                "OPENAI_API_KEY",
            ),
            Self::new(
                "claude",
                "https://api.anthropic.com",
                Some("/v1"),
                header("x-api-key"),
                "ANTHROPIC_API_KEY",
            ),
            Self::new(
                "gemini",
                "https://generativelanguage.googleapis.com",
                Some("/v1beta"),
                header("x-goog-api-key"),
                "GEMINI_API_KEY",
            ),
            Self::new(
                "groq",
                "https://api.groq.com/openai/v1",
                None,
                CredentialConfig::Bearer,
                "GROQ_API_KEY",
            ),
            Self::new(
                "grok",
                "https://api.x.ai/v1",
                None,
                CredentialConfig::Bearer,
                "XAI_API_KEY",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_order_and_prefixes() {
        let config = ProxyConfig::default();
        let prefixes: Vec<&str> = config.providers.iter().map(|p| p.prefix.as_str()).collect();
        assert_eq!(prefixes, ["/chatgpt", "/claude", "/gemini", "/groq", "/grok"]);
        assert!(config.providers.iter().all(|p| p.api_key.is_none()));
    }

    #[test]
    fn test_credential_config_from_toml() {
        let provider: ProviderConfig = toml::from_str(
            r#"
            name = "local"
            prefix = "/local"
            upstream_base = "http://127.0.0.1:11434"
            credential = { kind = "header", name = "x-api-key" }
            api_key_env = "LOCAL_KEY"
            "#,
        )
        .unwrap();
        assert_eq!(
            provider.credential,
            CredentialConfig::Header {
                name: "x-api-key".into()
            }
        );
        assert_eq!(provider.version_segment, None);
    }
}
