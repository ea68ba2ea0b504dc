//! Channel-level error type shared by the sender and receiver.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, error::ProtocolError};

use crate::protocol::CodecError;

/// Errors raised while reading from or writing to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer sent a close frame, or vanished without one.
    #[error("channel closed by peer (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    /// A frame could not be decoded, or a message could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Underlying WebSocket / IO failure.
    #[error("transport error: {0}")]
    Transport(#[source] axum::Error),

    /// A bounded write did not finish in time.
    #[error("write timed out after {0:?}")]
    Timeout(Duration),
}

impl ChannelError {
    /// Build from a received close frame. A frame without a status maps to
    /// 1005 (no status received).
    pub fn from_close_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => ChannelError::Closed {
                code: frame.code,
                reason: frame.reason.as_str().to_string(),
            },
            None => ChannelError::Closed {
                code: close_code::STATUS,
                reason: String::new(),
            },
        }
    }

    /// Stream ended without a close handshake.
    pub fn dropped() -> Self {
        ChannelError::Closed {
            code: close_code::ABNORMAL,
            reason: "connection dropped without close frame".to_string(),
        }
    }

    /// Close code observed for this error, if the error represents a close.
    ///
    /// Transport failures caused by the peer disappearing (reset, EOF,
    /// already-closed connection) report 1006, abnormal closure.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            ChannelError::Closed { code, .. } => Some(*code),
            ChannelError::Transport(err) if is_abrupt_disconnect(err) => Some(close_code::ABNORMAL),
            _ => None,
        }
    }
}

impl From<axum::Error> for ChannelError {
    fn from(err: axum::Error) -> Self {
        ChannelError::Transport(err)
    }
}

fn is_abrupt_disconnect(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(ws) = cause.downcast_ref::<tungstenite::Error>() {
            return match ws {
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
                tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
                tungstenite::Error::Io(io) => is_disconnect_kind(io.kind()),
                _ => false,
            };
        }
        if let Some(io) = cause.downcast_ref::<io::Error>() {
            return is_disconnect_kind(io.kind());
        }
        source = cause.source();
    }
    false
}

fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
