//! TLS WebSocket messaging gateway.
//!
//! Accepts WebSocket upgrades on a single endpoint, answers each inbound
//! message with a configured response, and drains sessions on SIGINT/SIGTERM.
//!
//! ```text
//!   client ──TLS──▶ net::tls ──▶ http::server ──▶ http::websocket
//!                                                   │ OriginGuard
//!                                                   ▼
//!                               session::Session  (receive → dispatch → send)
//!                                   │        │
//!                            messaging::Receiver  messaging::Sender
//!                                   └── protocol::codec ──┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ws_gateway::config::load_config;
use ws_gateway::lifecycle::startup;
use ws_gateway::observability::{logging, metrics};

/// TLS WebSocket messaging gateway
#[derive(Parser, Debug)]
#[command(name = "ws-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "configs/config.toml")]
    config: PathBuf,

    /// Validate configuration and TLS material, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if cli.check_config {
        match startup::check(&config).await {
            Ok(()) => {
                println!("Configuration is valid");
                return;
            }
            Err(e) => {
                eprintln!("Configuration check failed: {e}");
                std::process::exit(1);
            }
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "ws-gateway starting"
    );

    if config.observability.metrics_enabled {
        // Already validated by the loader.
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                    std::process::exit(1);
                }
            }
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Gateway terminated with error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
