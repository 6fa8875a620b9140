//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration (file or built-in defaults) and apply overrides
//! - Resolve credentials from the environment
//! - Initialize logging and metrics
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last, so traffic arrives only when ready

use std::net::SocketAddr;
use std::path::PathBuf;

use metrics_exporter_prometheus::BuildError;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ProxyConfig};
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::{logging, metrics};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server: {0}")]
    Server(#[from] ServerError),

    #[error("metrics: {0}")]
    Metrics(#[from] BuildError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the configuration comes from and what the command line overrides.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
}

/// Load the configuration and apply command-line overrides.
///
/// Credentials are not resolved here.
pub fn load(options: &StartupOptions) -> Result<ProxyConfig, StartupError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
        config.validate()?;
    }
    Ok(config)
}

/// Bring the proxy up and serve until SIGINT/SIGTERM.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let mut config = load(&options)?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "inference-proxy starting");
    config.warn_shadowed_routes();
    config.resolve_secrets_from_env();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        providers = config.providers.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        response_header_timeout_secs = config.timeouts.response_header_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation has already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_os_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
