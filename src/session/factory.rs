//! Builds sessions around upgraded channels.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as Frame, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, Stream, StreamExt};

use crate::config::{GatewayConfig, ResponseTexts};
use crate::lifecycle::Shutdown;
use crate::messaging::{Dispatcher, Receiver, Sender};
use crate::net::connection::SessionTracker;
use crate::session::handler::Session;

/// A session over a live WebSocket channel.
pub type WsSession = Session<SplitSink<WebSocket, Frame>, SplitStream<WebSocket>>;

/// Shared wiring handed to every new session.
///
/// Each session gets its own dispatcher, endpoints and force-close
/// subscription, and is counted by the tracker until it releases its channel.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    responses: Arc<ResponseTexts>,
    tracker: SessionTracker,
    shutdown: Shutdown,
    close_timeout: Duration,
}

impl SessionFactory {
    pub fn new(
        responses: Arc<ResponseTexts>,
        tracker: SessionTracker,
        shutdown: Shutdown,
        close_timeout: Duration,
    ) -> Self {
        Self {
            responses,
            tracker,
            shutdown,
            close_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig, tracker: SessionTracker, shutdown: Shutdown) -> Self {
        Self::new(
            Arc::new(config.responses.clone()),
            tracker,
            shutdown,
            config.shutdown.close_timeout(),
        )
    }

    /// Split an upgraded socket into its endpoints and bind a session to them.
    pub fn create(&self, socket: WebSocket, peer: SocketAddr) -> WsSession {
        let (sink, stream) = socket.split();
        self.bind(sink, stream, peer)
    }

    /// Bind a session to an arbitrary pair of endpoints.
    pub fn bind<S, R>(&self, sink: S, stream: R, peer: SocketAddr) -> Session<S, R>
    where
        S: Sink<Frame, Error = axum::Error> + Unpin,
        R: Stream<Item = Result<Frame, axum::Error>> + Unpin,
    {
        Session::new(
            self.tracker.track(),
            peer,
            Sender::new(sink),
            Receiver::new(stream),
            Dispatcher::new(Arc::clone(&self.responses)),
            self.shutdown.subscribe(),
            self.close_timeout,
        )
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }
}
