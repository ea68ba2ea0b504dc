//! Receiving half of a message channel.

use axum::extract::ws::Message as Frame;
use futures_util::{Stream, StreamExt};

use crate::messaging::error::ChannelError;
use crate::protocol::{self, Message};

/// Reads and decodes one [`Message`] at a time from its bound stream.
pub struct Receiver<R> {
    stream: R,
}

impl<R> Receiver<R>
where
    R: Stream<Item = Result<Frame, axum::Error>> + Unpin,
{
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Wait for the next data frame and decode it.
    ///
    /// Ping and pong frames are skipped. A close frame or the end of the
    /// stream surfaces as [`ChannelError::Closed`]. Cancel-safe: no frame is
    /// lost if the returned future is dropped before completion.
    pub async fn receive(&mut self) -> Result<Message, ChannelError> {
        loop {
            let frame = match self.stream.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(ChannelError::from(e)),
                None => return Err(ChannelError::dropped()),
            };

            let message = match frame {
                Frame::Text(text) => protocol::decode(text.as_str())?,
                Frame::Binary(bytes) => protocol::decode_bytes(&bytes)?,
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(frame) => return Err(ChannelError::from_close_frame(frame)),
            };

            tracing::debug!(kind = %message.kind(), "Message received");
            return Ok(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageType;
    use axum::extract::ws::CloseFrame;
    use futures_util::stream;

    fn receiver(frames: Vec<Result<Frame, axum::Error>>) -> Receiver<impl Stream<Item = Result<Frame, axum::Error>> + Unpin> {
        Receiver::new(stream::iter(frames))
    }

    #[tokio::test]
    async fn decodes_text_frames() {
        let mut rx = receiver(vec![Ok(Frame::Text(r#"{"type":"data","text":"hello"}"#.into()))]);
        assert_eq!(rx.receive().await.unwrap(), Message::data("hello"));
    }

    #[tokio::test]
    async fn decodes_binary_frames() {
        let mut rx = receiver(vec![Ok(Frame::Binary(r#"{"type":"info","text":"i"}"#.as_bytes().to_vec().into()))]);
        assert_eq!(rx.receive().await.unwrap(), Message::info("i"));
    }

    #[tokio::test]
    async fn skips_control_frames() {
        let mut rx = receiver(vec![
            Ok(Frame::Ping(vec![1].into())),
            Ok(Frame::Pong(vec![2].into())),
            Ok(Frame::Text(r#"{"type":"bogus","text":"x"}"#.into())),
        ]);
        let msg = rx.receive().await.unwrap();
        assert_eq!(msg.kind(), &MessageType::Unrecognized("bogus".into()));
    }

    #[tokio::test]
    async fn malformed_frame_is_codec_error() {
        let mut rx = receiver(vec![Ok(Frame::Text("{oops".into()))]);
        assert!(matches!(rx.receive().await, Err(ChannelError::Codec(_))));
    }

    #[tokio::test]
    async fn close_frame_is_reported_with_code() {
        let mut rx = receiver(vec![Ok(Frame::Close(Some(CloseFrame {
            code: 1000,
            reason: "bye".into(),
        })))]);
        let err = rx.receive().await.unwrap_err();
        assert_eq!(err.close_code(), Some(1000));
    }

    #[tokio::test]
    async fn end_of_stream_is_abnormal_closure() {
        let mut rx = receiver(vec![]);
        assert_eq!(rx.receive().await.unwrap_err().close_code(), Some(1006));
    }

    #[tokio::test]
    async fn transport_error_is_propagated() {
        let mut rx = receiver(vec![Err(axum::Error::new(std::io::Error::other("tls failure")))]);
        assert!(matches!(rx.receive().await, Err(ChannelError::Transport(_))));
    }
}
