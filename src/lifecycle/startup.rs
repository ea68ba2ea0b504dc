//! Startup orchestration.
//!
//! # Responsibilities
//! - Load TLS material
//! - Register termination signal handlers
//! - Build the server and run it until shutdown completes
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Signal handlers are installed before the listener binds

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::{GatewayServer, ServerError};
use crate::lifecycle::signals::{shutdown_signal, TerminationSignals};
use crate::net::tls::{load_tls_config, TlsError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Run the gateway until a termination signal has been handled.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let tls = load_tls_config(&config.tls.cert_path, &config.tls.key_path).await?;
    let signals = TerminationSignals::register().map_err(StartupError::Signals)?;

    tracing::info!(
        address = %config.listener.address(),
        path = %config.websocket.path,
        debug = config.websocket.debug,
        forbidden_origins = config.websocket.forbidden_origins.len(),
        "Starting gateway"
    );
    if config.websocket.debug {
        tracing::warn!("Debug mode: origin checks are disabled");
    }

    let server = GatewayServer::new(config);
    server.run(tls, shutdown_signal(signals)).await?;
    Ok(())
}

/// Validate everything `run` would need without binding a listener.
pub async fn check(config: &GatewayConfig) -> Result<(), StartupError> {
    load_tls_config(&config.tls.cert_path, &config.tls.key_path).await?;
    Ok(())
}
