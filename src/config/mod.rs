//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, trim upstream bases)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig::resolve_secrets (API keys + shared secret from env)
//!     → ProxyConfig (validated, immutable)
//!     → compiled into RouteTable / AuthGate / HeaderSanitizer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults; with no file the canonical provider table is used
//! - Validation separates syntactic (serde) from semantic checks
//! - Missing API keys are not a load error; they fail per route, per request

pub mod loader;
pub mod schema;
pub mod secret;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, CredentialConfig, HeaderPolicyConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProviderConfig, ProxyConfig, TimeoutConfig, UpstreamConfig,
};
pub use secret::Secret;
