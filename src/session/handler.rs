//! The per-connection receive → process → send loop.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{close_code, Message as Frame};
use futures_util::{Sink, Stream};
use tracing::Instrument;

use crate::lifecycle::ShutdownSignal;
use crate::messaging::{ChannelError, Dispatcher, Receiver, Sender};
use crate::net::connection::{SessionGuard, SessionId};
use crate::observability::metrics;
use crate::protocol::Message;
use crate::session::classify::{classify, Disposition};

/// Text of the `error_response` sent when a session ends on an error.
pub const ERROR_ACK_TEXT: &str = "error acknowledged";

const CLOSE_ACK_REASON: &str = "connection closed";
const SHUTDOWN_REASON: &str = "server shutting down";

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Loop running.
    Open,
    /// A failure was observed, notification and cleanup in progress.
    Closing,
    /// Channel released.
    Closed,
}

/// Loop step that observed the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Receive,
    Send,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Receive => f.write_str("receive"),
            Phase::Send => f.write_str("send"),
        }
    }
}

/// Why a session ended.
#[derive(Debug)]
pub enum Termination {
    /// Peer closed the channel (normal, going away, or abnormal closure).
    PeerClosed { phase: Phase, code: u16 },
    /// Decode, transport or other unexpected failure.
    Failed { phase: Phase, error: ChannelError },
    /// Closed by the runtime after the shutdown grace period.
    Forced,
}

impl Termination {
    fn from_error(phase: Phase, error: ChannelError) -> Self {
        match classify(&error) {
            Disposition::PeerClose => Termination::PeerClosed {
                phase,
                code: error.close_code().unwrap_or(close_code::ABNORMAL),
            },
            Disposition::OtherError => Termination::Failed { phase, error },
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Termination::PeerClosed { .. } => "peer_close",
            Termination::Failed { .. } => "error",
            Termination::Forced => "forced",
        }
    }
}

/// Summary returned once a session has released its channel.
#[derive(Debug)]
pub struct SessionReport {
    pub id: SessionId,
    /// Always [`SessionState::Closed`]: a report only exists once the channel is released.
    pub state: SessionState,
    /// Messages answered before the session ended.
    pub messages: u64,
    pub termination: Termination,
}

/// Owns one upgraded channel for its whole lifetime.
pub struct Session<S, R> {
    guard: SessionGuard,
    peer: SocketAddr,
    sender: Sender<S>,
    receiver: Receiver<R>,
    dispatcher: Dispatcher,
    force_close: ShutdownSignal,
    close_timeout: Duration,
    state: SessionState,
}

impl<S, R> Session<S, R>
where
    S: Sink<Frame, Error = axum::Error> + Unpin,
    R: Stream<Item = Result<Frame, axum::Error>> + Unpin,
{
    pub fn new(
        guard: SessionGuard,
        peer: SocketAddr,
        sender: Sender<S>,
        receiver: Receiver<R>,
        dispatcher: Dispatcher,
        force_close: ShutdownSignal,
        close_timeout: Duration,
    ) -> Self {
        Self {
            guard,
            peer,
            sender,
            receiver,
            dispatcher,
            force_close,
            close_timeout,
            state: SessionState::Open,
        }
    }

    pub fn id(&self) -> SessionId {
        self.guard.id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session until its first failure, then notify the peer and
    /// release the channel.
    pub async fn run(self) -> SessionReport {
        let span = tracing::info_span!("session", session = %self.guard.id(), peer = %self.peer);
        self.drive().instrument(span).await
    }

    async fn drive(mut self) -> SessionReport {
        tracing::info!("Session opened");
        metrics::session_opened();

        let (termination, messages) = self.exchange().await;

        transition(&mut self.state, SessionState::Closing);
        self.notify(&termination).await;

        let Session {
            guard,
            sender,
            receiver,
            close_timeout,
            mut state,
            ..
        } = self;
        if let Err(e) = sender.release(close_timeout).await {
            tracing::debug!(error = %e, "Channel release did not complete cleanly");
        }
        drop(receiver);
        transition(&mut state, SessionState::Closed);

        tracing::info!(
            termination = termination.label(),
            messages,
            "Session closed"
        );
        metrics::session_closed(termination.label());

        SessionReport {
            id: guard.id(),
            state,
            messages,
            termination,
        }
    }

    /// Strictly sequential receive → process → send until something fails.
    async fn exchange(&mut self) -> (Termination, u64) {
        let mut handled = 0u64;

        loop {
            let received = tokio::select! {
                biased;
                _ = self.force_close.recv() => return (Termination::Forced, handled),
                received = self.receiver.receive() => received,
            };
            let inbound = match received {
                Ok(message) => message,
                Err(e) => return (Termination::from_error(Phase::Receive, e), handled),
            };

            metrics::record_message(inbound.kind());
            let response = self.dispatcher.process(&inbound);

            let sent = tokio::select! {
                biased;
                _ = self.force_close.recv() => return (Termination::Forced, handled),
                sent = self.sender.send(&response) => sent,
            };
            if let Err(e) = sent {
                return (Termination::from_error(Phase::Send, e), handled);
            }

            handled += 1;
        }
    }

    /// Best-effort notification. Failures are logged and never escalated.
    async fn notify(&mut self, termination: &Termination) {
        match termination {
            Termination::PeerClosed { phase, code } => {
                tracing::debug!(%phase, code, "Peer closed the channel");
                if let Err(e) = self
                    .sender
                    .send_close(close_code::NORMAL, CLOSE_ACK_REASON, self.close_timeout)
                    .await
                {
                    tracing::debug!(error = %e, "Close acknowledgement not delivered");
                }
            }
            Termination::Failed { phase, error } => {
                tracing::error!(%phase, error = %error, "Session failed");
                let ack = Message::error_response(ERROR_ACK_TEXT);
                match tokio::time::timeout(self.close_timeout, self.sender.send(&ack)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "Error acknowledgement not delivered"),
                    Err(_) => tracing::warn!(
                        timeout = ?self.close_timeout,
                        "Error acknowledgement timed out"
                    ),
                }
            }
            Termination::Forced => {
                tracing::info!("Closing session for shutdown");
                if let Err(e) = self
                    .sender
                    .send_close(close_code::AWAY, SHUTDOWN_REASON, self.close_timeout)
                    .await
                {
                    tracing::debug!(error = %e, "Shutdown close frame not delivered");
                }
            }
        }
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    tracing::debug!(from = ?*state, to = ?next, "Session state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseTexts;
    use crate::lifecycle::Shutdown;
    use crate::net::connection::SessionTracker;
    use crate::protocol::{self, MessageType};
    use crate::session::SessionFactory;
    use axum::extract::ws::CloseFrame;
    use futures_util::{stream, StreamExt};
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    type Inbound = Result<Frame, axum::Error>;

    /// Sink double that records frames and counts closes.
    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Frame>>>,
        closes: Arc<AtomicUsize>,
        fail_with: Option<io::ErrorKind>,
    }

    impl RecordingSink {
        fn failing(kind: io::ErrorKind) -> Self {
            Self {
                fail_with: Some(kind),
                ..Default::default()
            }
        }

        fn frames(&self) -> Vec<Frame> {
            self.frames.lock().unwrap().clone()
        }

        fn messages(&self) -> Vec<Message> {
            self.frames()
                .into_iter()
                .filter_map(|f| match f {
                    Frame::Text(t) => Some(protocol::decode(t.as_str()).unwrap()),
                    _ => None,
                })
                .collect()
        }

        fn close_frames(&self) -> Vec<u16> {
            self.frames()
                .into_iter()
                .filter_map(|f| match f {
                    Frame::Close(Some(frame)) => Some(frame.code),
                    _ => None,
                })
                .collect()
        }
    }

    impl Sink<Frame> for RecordingSink {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Frame) -> Result<(), Self::Error> {
            if let Some(kind) = self.fail_with {
                return Err(axum::Error::new(io::Error::new(kind, "write failed")));
            }
            self.frames.lock().unwrap().push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    struct Harness {
        factory: SessionFactory,
        tracker: SessionTracker,
        shutdown: Shutdown,
    }

    impl Harness {
        fn new() -> Self {
            let tracker = SessionTracker::new();
            let shutdown = Shutdown::new();
            let responses = ResponseTexts {
                error: "E".into(),
                info: "I".into(),
                data: "D".into(),
                unknown: "U".into(),
            };
            let factory = SessionFactory::new(
                Arc::new(responses),
                tracker.clone(),
                shutdown.clone(),
                Duration::from_millis(200),
            );
            Self {
                factory,
                tracker,
                shutdown,
            }
        }

        async fn run(&self, sink: RecordingSink, frames: Vec<Inbound>) -> SessionReport {
            let session = self
                .factory
                .bind(sink, stream::iter(frames), "127.0.0.1:40000".parse().unwrap());
            assert_eq!(session.state(), SessionState::Open);
            assert_eq!(self.tracker.active_count(), 1);
            session.run().await
        }
    }

    fn text(json: &str) -> Inbound {
        Ok(Frame::Text(json.into()))
    }

    fn close(code: u16) -> Inbound {
        Ok(Frame::Close(Some(CloseFrame {
            code,
            reason: "bye".into(),
        })))
    }

    #[tokio::test]
    async fn answers_each_message_in_order_then_acknowledges_close() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness
            .run(
                sink.clone(),
                vec![
                    text(r#"{"type":"data","text":"hello"}"#),
                    text(r#"{"type":"info","text":"i"}"#),
                    text(r#"{"type":"error","text":"e"}"#),
                    close(close_code::NORMAL),
                ],
            )
            .await;

        assert_eq!(report.messages, 3);
        assert_eq!(report.state, SessionState::Closed);
        assert!(matches!(
            report.termination,
            Termination::PeerClosed { phase: Phase::Receive, code: 1000 }
        ));
        assert_eq!(
            sink.messages(),
            vec![
                Message::data_response("D"),
                Message::info_response("I"),
                Message::error_response("E"),
            ]
        );
        assert_eq!(sink.close_frames(), vec![close_code::NORMAL]);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        assert_eq!(harness.tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn unknown_type_gets_unknown_response() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        harness
            .run(
                sink.clone(),
                vec![text(r#"{"type":"bogus","text":"x"}"#), close(close_code::AWAY)],
            )
            .await;

        let messages = sink.messages();
        assert_eq!(messages[0].kind(), &MessageType::UnknownResponse);
        assert_eq!(messages[0].text(), "U");
    }

    #[tokio::test]
    async fn null_text_is_answered_normally() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness
            .run(
                sink.clone(),
                vec![text(r#"{"type":"data","text":null}"#), close(close_code::NORMAL)],
            )
            .await;

        assert_eq!(report.messages, 1);
        assert_eq!(sink.messages(), vec![Message::data_response("D")]);
    }

    #[tokio::test]
    async fn malformed_payload_ends_session_with_error_ack() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness
            .run(
                sink.clone(),
                vec![text("{not json"), text(r#"{"type":"data","text":"never"}"#)],
            )
            .await;

        assert_eq!(report.messages, 0);
        assert!(matches!(
            report.termination,
            Termination::Failed { phase: Phase::Receive, error: ChannelError::Codec(_) }
        ));
        assert_eq!(sink.messages(), vec![Message::error_response(ERROR_ACK_TEXT)]);
        assert!(sink.close_frames().is_empty());
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_error_on_receive_is_not_a_peer_close() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness
            .run(sink.clone(), vec![Err(axum::Error::new(io::Error::other("tls alert")))])
            .await;

        assert_eq!(report.termination.label(), "error");
        assert_eq!(sink.messages(), vec![Message::error_response(ERROR_ACK_TEXT)]);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_without_status_is_treated_as_error() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness.run(sink.clone(), vec![Ok(Frame::Close(None))]).await;

        assert_eq!(report.termination.label(), "error");
        assert_eq!(sink.messages(), vec![Message::error_response(ERROR_ACK_TEXT)]);
    }

    #[tokio::test]
    async fn stream_end_is_abnormal_peer_close() {
        let harness = Harness::new();
        let sink = RecordingSink::default();

        let report = harness
            .run(sink.clone(), vec![text(r#"{"type":"info","text":"last"}"#)])
            .await;

        assert_eq!(report.messages, 1);
        assert!(matches!(
            report.termination,
            Termination::PeerClosed { code: 1006, .. }
        ));
        assert_eq!(sink.close_frames(), vec![close_code::NORMAL]);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_failure_ends_session_and_still_releases_once() {
        let harness = Harness::new();
        let sink = RecordingSink::failing(io::ErrorKind::Other);

        let report = harness
            .run(sink.clone(), vec![text(r#"{"type":"data","text":"x"}"#)])
            .await;

        assert_eq!(report.messages, 0);
        assert!(matches!(
            report.termination,
            Termination::Failed { phase: Phase::Send, error: ChannelError::Transport(_) }
        ));
        assert_eq!(report.state, SessionState::Closed);
        assert!(sink.frames().is_empty());
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        assert_eq!(harness.tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn broken_pipe_on_send_is_a_peer_close() {
        let harness = Harness::new();
        let sink = RecordingSink::failing(io::ErrorKind::BrokenPipe);

        let report = harness
            .run(sink.clone(), vec![text(r#"{"type":"data","text":"x"}"#)])
            .await;

        assert!(matches!(
            report.termination,
            Termination::PeerClosed { phase: Phase::Send, code: 1006 }
        ));
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forced_close_interrupts_a_waiting_session() {
        let harness = Harness::new();
        let sink = RecordingSink::default();
        let frames = stream::iter(vec![text(r#"{"type":"info","text":"a"}"#)]).chain(stream::pending());
        let session = harness
            .factory
            .bind(sink.clone(), frames, "127.0.0.1:40001".parse().unwrap());

        let task = tokio::spawn(session.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        harness.shutdown.trigger();
        let report = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("session should stop")
            .unwrap();

        assert_eq!(report.messages, 1);
        assert!(matches!(report.termination, Termination::Forced));
        assert_eq!(report.state, SessionState::Closed);
        assert_eq!(sink.close_frames(), vec![close_code::AWAY]);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        assert_eq!(harness.tracker.active_count(), 0);
    }
}
