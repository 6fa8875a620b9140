//! `inference-proxy` binary.
//!
//! ```text
//! inference-proxy [--config FILE] [--bind ADDR] [serve|routes|check]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use inference_proxy::config::{CredentialConfig, ProxyConfig};
use inference_proxy::lifecycle::startup::{self, StartupOptions};
use inference_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "inference-proxy")]
#[command(about = "Reverse proxy fronting hosted inference APIs", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in provider table when omitted
    #[arg(short, long, env = "INFERENCE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy (default)
    Serve,
    /// Print the provider route table and which keys are configured
    Routes,
    /// Validate the configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        bind_address: cli.bind,
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => startup::run(options).await,
        Commands::Routes => startup::load(&options).map(|mut config| {
            logging::init_logging(&config.observability);
            config.resolve_secrets_from_env();
            print_routes(&config);
        }),
        Commands::Check => startup::load(&options).map(|config| {
            logging::init_logging(&config.observability);
            config.warn_shadowed_routes();
            println!(
                "configuration OK: {} provider(s), listening on {}",
                config.providers.len(),
                config.listener.bind_address
            );
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("inference-proxy: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_routes(config: &ProxyConfig) {
    println!(
        "{:<10} {:<10} {:<45} {:<8} {:<16} KEY",
        "PROVIDER", "PREFIX", "UPSTREAM", "VERSION", "CREDENTIAL"
    );
    for provider in &config.providers {
        let credential = match &provider.credential {
            CredentialConfig::Bearer => "authorization".to_string(),
            CredentialConfig::Header { name } => name.to_ascii_lowercase(),
        };
        let key = match &provider.api_key {
            Some(_) => "configured".to_string(),
            None => format!("missing (${})", provider.api_key_env),
        };
        println!(
            "{:<10} {:<10} {:<45} {:<8} {:<16} {}",
            provider.name,
            provider.prefix,
            provider.upstream_base,
            provider.version_segment.as_deref().unwrap_or("-"),
            credential,
            key
        );
    }
}
