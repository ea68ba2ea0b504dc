//! JSON encoding and decoding of [`Message`] frames.

use thiserror::Error;

use crate::protocol::message::Message;

/// Errors produced while converting between frames and messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is not a valid message object.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode a text frame payload.
pub fn decode(payload: &str) -> Result<Message, CodecError> {
    serde_json::from_str(payload).map_err(CodecError::Malformed)
}

/// Decode a binary frame payload.
pub fn decode_bytes(payload: &[u8]) -> Result<Message, CodecError> {
    serde_json::from_slice(payload).map_err(CodecError::Malformed)
}

/// Encode a message as a text frame payload.
pub fn encode(message: &Message) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}
