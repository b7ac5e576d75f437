//! Subscription aggregator — server binary
//!
//! ```sh
//! # Run with default config (~/.config/subscription-aggregator/config.toml)
//! subscription-aggregator
//!
//! # Custom config path
//! subscription-aggregator --config /etc/subscription-aggregator/config.toml
//!
//! # Override the port
//! subscription-aggregator --api-port 8081
//!
//! # Validate config without starting
//! subscription-aggregator --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use subscription_aggregator::config::{AppConfig, ConfigError};
use subscription_aggregator::infrastructure::database::redact_url;
use subscription_aggregator::server::{init_tracing, ServerHandle, ServerOptions};

/// Records user subscriptions and totals their cost.
#[derive(Parser, Debug)]
#[command(
    name = "subscription-aggregator",
    version,
    about = "REST service for subscription records and cost totals",
    long_about = "Subscription aggregator: REST API for creating, updating and deleting \
                  user subscriptions and summing their monthly prices over filters.\n\n\
                  Default config: ~/.config/subscription-aggregator/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "SUBSCRIPTIONS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(subscription_aggregator::default_config_path);

    let (mut config, load_outcome) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, Ok(())),
        Err(ConfigError::NotFound(path)) => (AppConfig::from_env()?, Err(ConfigError::NotFound(path))),
        Err(e) => {
            if cli.check {
                eprintln!("Configuration is invalid: {}", e);
                std::process::exit(1);
            }
            (AppConfig::from_env()?, Err(e))
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", redact_url(&config.database.connection_url()));
        println!("   Log level   : {}", config.logging.level);
        println!("   Log format  : {}", config.logging.format);
        return Ok(());
    }

    // Init tracing first so subsequent logs are formatted properly
    init_tracing(&config);
    match load_outcome {
        Ok(()) => info!("Configuration loaded from {}", config_path.display()),
        Err(ConfigError::NotFound(path)) => {
            info!("No config file at {}, using defaults and environment", path.display())
        }
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            warn!("Using default configuration.");
        }
    }
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
    }
    if let Some(level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
