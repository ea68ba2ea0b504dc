//! HTTP server setup and session runtime.
//!
//! # Responsibilities
//! - Create the Axum router with the single upgrade endpoint
//! - Serve it over TLS
//! - Publish the runtime state
//! - Drain sessions on shutdown, force-closing whatever outlives the grace period

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use thiserror::Error;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::websocket::{upgrade_handler, Upgrader};
use crate::lifecycle::Shutdown;
use crate::net::connection::SessionTracker;
use crate::security::OriginGuard;
use crate::session::SessionFactory;

/// Runtime lifecycle as seen by observers of [`GatewayServer::subscribe_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Starting,
    Accepting,
    Draining,
    Stopped,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to resolve listen address {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("listen address {0} did not resolve to any socket address")]
    NoAddress(String),

    #[error("server failed: {0}")]
    Serve(#[source] io::Error),
}

/// TLS WebSocket gateway.
pub struct GatewayServer {
    config: GatewayConfig,
    router: Router,
    tracker: SessionTracker,
    shutdown: Shutdown,
    handle: Handle,
    state: watch::Sender<RuntimeState>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let tracker = SessionTracker::new();
        let shutdown = Shutdown::new();

        let sessions = SessionFactory::from_config(&config, tracker.clone(), shutdown.clone());
        let upgrader = Upgrader::new(OriginGuard::from_config(&config.websocket), sessions);
        let router = Self::build_router(&config.websocket.path, upgrader);
        let (state, _) = watch::channel(RuntimeState::Starting);

        Self {
            config,
            router,
            tracker,
            shutdown,
            handle: Handle::new(),
            state,
        }
    }

    /// Build the Axum router: one upgrade route, everything else 404.
    pub fn build_router(path: &str, upgrader: Upgrader) -> Router {
        Router::new()
            .route(path, get(upgrade_handler))
            .with_state(upgrader)
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Server handle, e.g. to discover the bound address.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RuntimeState> {
        self.state.subscribe()
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Serve until `signal` resolves, then drain.
    ///
    /// Returns early with an error if the listener cannot be bound or fails
    /// while accepting.
    pub async fn run<F>(self, tls: RustlsConfig, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.resolve().await?;
        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();

        let serve = axum_server::bind_rustls(addr, tls)
            .handle(self.handle.clone())
            .serve(app);
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return self.stopped(result),
            bound = self.handle.listening() => {
                if let Some(local) = bound {
                    tracing::info!(address = %local, path = %self.config.websocket.path, "Gateway accepting sessions");
                }
            }
        }
        self.state.send_replace(RuntimeState::Accepting);

        tokio::select! {
            result = &mut serve => return self.stopped(result),
            () = signal => {}
        }

        self.state.send_replace(RuntimeState::Draining);
        let grace = self.config.shutdown.grace_period();
        tracing::info!(
            active_sessions = self.tracker.active_count(),
            grace_period = ?grace,
            "Draining sessions"
        );

        self.handle.graceful_shutdown(Some(grace));
        let (result, drained) = tokio::join!(
            &mut serve,
            tokio::time::timeout(grace, self.tracker.wait_idle())
        );

        if drained.is_err() {
            self.force_close().await;
        }

        self.stopped(result)
    }

    async fn force_close(&self) {
        tracing::warn!(
            remaining = self.tracker.active_count(),
            "Grace period elapsed, closing remaining sessions"
        );
        self.shutdown.trigger();

        // One close-frame write plus one release per session.
        let deadline = self.config.shutdown.close_timeout() * 2 + Duration::from_millis(100);
        if tokio::time::timeout(deadline, self.tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Sessions still open at exit"
            );
        }
    }

    fn stopped(&self, result: io::Result<()>) -> Result<(), ServerError> {
        self.state.send_replace(RuntimeState::Stopped);
        match result {
            Ok(()) => {
                tracing::info!("Gateway stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Gateway server failed");
                Err(ServerError::Serve(e))
            }
        }
    }

    async fn resolve(&self) -> Result<SocketAddr, ServerError> {
        let address = self.config.listener.address();
        let first = tokio::net::lookup_host(address.clone())
            .await
            .map_err(|source| ServerError::Resolve {
                address: address.clone(),
                source,
            })?
            .next();
        first.ok_or(ServerError::NoAddress(address))
    }
}
