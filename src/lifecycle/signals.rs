//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers before the listener starts
//! - Resolve once either arrives, so the runtime can begin draining
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration failures surface at startup rather than at shutdown

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Registered termination signal handlers.
#[derive(Debug)]
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl TerminationSignals {
    /// Install the handlers.
    pub fn register() -> io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the first termination signal and return its name.
    pub async fn recv(mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.terminate.recv() => "SIGTERM",
            }
        }

        #[cfg(not(unix))]
        {
            match tokio::signal::ctrl_c().await {
                Ok(()) => "ctrl-c",
                Err(e) => {
                    tracing::error!(error = %e, "Ctrl+C handler failed");
                    std::future::pending().await
                }
            }
        }
    }
}

/// Resolve on the first SIGINT/SIGTERM, logging which one arrived.
pub async fn shutdown_signal(signals: TerminationSignals) {
    let name = signals.recv().await;
    tracing::info!(signal = name, "Shutdown signal received");
}
