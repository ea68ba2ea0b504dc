//! WebSocket upgrade handling.
//!
//! # Responsibilities
//! - Validate the upgrade handshake
//! - Admit or reject the requesting origin through [`OriginGuard`]
//! - Bind a fresh session to the upgraded channel
//!
//! # Data Flow
//! ```text
//! GET /ws (Upgrade: websocket)
//!     → handshake validation (axum WebSocketUpgrade)
//!     → OriginGuard::allow(Origin header)
//!     → 101 Switching Protocols
//!     → SessionFactory::create(channel) → Session::run
//! ```
//!
//! # Design Decisions
//! - The session is built inside the upgrade callback, so the channel is
//!   bound to its endpoints before the first frame can be read
//! - Rejections never reach the session layer

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;
use crate::security::OriginGuard;
use crate::session::SessionFactory;

/// Reasons an upgrade attempt does not produce a channel.
#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("origin '{origin}' is not allowed")]
    OriginRejected { origin: String },

    #[error("websocket handshake failed: {0}")]
    HandshakeFailed(#[from] WebSocketUpgradeRejection),
}

impl UpgradeError {
    fn outcome(&self) -> &'static str {
        match self {
            UpgradeError::OriginRejected { .. } => "origin_rejected",
            UpgradeError::HandshakeFailed(_) => "handshake_failed",
        }
    }
}

impl IntoResponse for UpgradeError {
    fn into_response(self) -> Response {
        match self {
            UpgradeError::OriginRejected { .. } => {
                (StatusCode::FORBIDDEN, "Origin not allowed").into_response()
            }
            UpgradeError::HandshakeFailed(rejection) => rejection.into_response(),
        }
    }
}

/// Upgrade endpoint state: admission policy plus the session factory.
#[derive(Debug, Clone)]
pub struct Upgrader {
    guard: OriginGuard,
    sessions: SessionFactory,
}

impl Upgrader {
    pub fn new(guard: OriginGuard, sessions: SessionFactory) -> Self {
        Self { guard, sessions }
    }

    /// Admission check for a handshake that has already been validated.
    pub fn admit(&self, headers: &HeaderMap) -> Result<(), UpgradeError> {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if self.guard.allow(origin) {
            Ok(())
        } else {
            Err(UpgradeError::OriginRejected {
                origin: origin.to_string(),
            })
        }
    }

    pub fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }
}

/// Route handler for the single upgrade endpoint.
pub async fn upgrade_handler(
    State(upgrader): State<Upgrader>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade
        .map_err(UpgradeError::from)
        .and_then(|ws| upgrader.admit(&headers).map(|()| ws))
    {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "Upgrade rejected");
            metrics::record_handshake(e.outcome());
            return e.into_response();
        }
    };

    metrics::record_handshake("accepted");
    tracing::debug!(peer = %peer, "Upgrading connection");

    let sessions = upgrader.sessions.clone();
    ws.on_failed_upgrade(move |e| {
        tracing::warn!(peer = %peer, error = %e, "Upgrade failed after handshake");
    })
    .on_upgrade(move |socket| async move {
        let report = sessions.create(socket, peer).run().await;
        tracing::trace!(session = %report.id, messages = report.messages, "Session finished");
    })
}
