//! Multi-provider inference reverse proxy.
//!
//! One HTTP listener fronts several hosted model APIs. The first path
//! segment picks the provider, the proxy injects that provider's credential
//! and streams request and response bodies through unchanged.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
