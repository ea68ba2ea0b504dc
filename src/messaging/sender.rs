//! Sending half of a message channel.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message as Frame};
use futures_util::{Sink, SinkExt};

use crate::messaging::error::ChannelError;
use crate::protocol::{self, Message};

/// Close reasons are limited to 123 bytes by the WebSocket framing.
const MAX_CLOSE_REASON: usize = 123;

/// Encodes and writes messages to its bound sink.
pub struct Sender<S> {
    sink: S,
}

impl<S> Sender<S>
where
    S: Sink<Frame, Error = axum::Error> + Unpin,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Serialize and write one message as a text frame.
    pub async fn send(&mut self, message: &Message) -> Result<(), ChannelError> {
        let payload = protocol::encode(message)?;
        self.sink.send(Frame::Text(payload.into())).await?;
        tracing::debug!(kind = %message.kind(), "Message sent");
        Ok(())
    }

    /// Write a close frame, giving up after `deadline`.
    pub async fn send_close(
        &mut self,
        code: u16,
        reason: &str,
        deadline: Duration,
    ) -> Result<(), ChannelError> {
        let frame = CloseFrame {
            code,
            reason: truncate_reason(reason).into(),
        };
        match tokio::time::timeout(deadline, self.sink.send(Frame::Close(Some(frame)))).await {
            Ok(result) => result.map_err(ChannelError::from),
            Err(_) => Err(ChannelError::Timeout(deadline)),
        }
    }

    /// Close the sink, releasing the channel. Consumes the sender so it can
    /// only happen once.
    pub async fn release(mut self, deadline: Duration) -> Result<(), ChannelError> {
        match tokio::time::timeout(deadline, self.sink.close()).await {
            Ok(result) => result.map_err(ChannelError::from),
            Err(_) => Err(ChannelError::Timeout(deadline)),
        }
    }
}

fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}
