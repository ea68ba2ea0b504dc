//! Failure classification for ending sessions.

use axum::extract::ws::close_code;

use crate::messaging::ChannelError;

/// How a session reacts to the error that ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Peer closed (normal, going away, or abnormal closure): acknowledge
    /// with a close frame.
    PeerClose,
    /// Anything else: acknowledge with an `error_response` message.
    OtherError,
}

/// Classify an observed close code. `None` means the error was not a close.
pub fn classify_close_code(code: Option<u16>) -> Disposition {
    match code {
        Some(close_code::NORMAL) | Some(close_code::AWAY) | Some(close_code::ABNORMAL) => {
            Disposition::PeerClose
        }
        _ => Disposition::OtherError,
    }
}

pub fn classify(error: &ChannelError) -> Disposition {
    classify_close_code(error.close_code())
}
