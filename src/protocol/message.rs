//! Message model exchanged over an upgraded channel.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Closed set of message kinds.
///
/// The first three are sent by clients, the four `*Response` kinds are sent
/// by the gateway. Any other tag seen on the wire is kept verbatim in
/// [`MessageType::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Error,
    Info,
    Data,
    ErrorResponse,
    InfoResponse,
    DataResponse,
    UnknownResponse,
    /// A tag outside the known set.
    Unrecognized(String),
}

impl MessageType {
    /// Wire tag for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Error => "error",
            MessageType::Info => "info",
            MessageType::Data => "data",
            MessageType::ErrorResponse => "error_response",
            MessageType::InfoResponse => "info_response",
            MessageType::DataResponse => "data_response",
            MessageType::UnknownResponse => "unknown_response",
            MessageType::Unrecognized(tag) => tag,
        }
    }

    /// Whether the tag was part of the known set when decoded.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, MessageType::Unrecognized(_))
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "error" => MessageType::Error,
            "info" => MessageType::Info,
            "data" => MessageType::Data,
            "error_response" => MessageType::ErrorResponse,
            "info_response" => MessageType::InfoResponse,
            "data_response" => MessageType::DataResponse,
            "unknown_response" => MessageType::UnknownResponse,
            _ => MessageType::Unrecognized(tag),
        }
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        MessageType::from(tag.to_string())
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Unrecognized(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol message.
///
/// Constructed once and never mutated; fields are only reachable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    kind: MessageType,
    #[serde(default, deserialize_with = "null_as_empty")]
    text: String,
}

/// A `null` payload is read as empty text.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    pub fn new(kind: MessageType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    pub fn data(text: impl Into<String>) -> Self {
        Self::new(MessageType::Data, text)
    }

    pub fn error_response(text: impl Into<String>) -> Self {
        Self::new(MessageType::ErrorResponse, text)
    }

    pub fn info_response(text: impl Into<String>) -> Self {
        Self::new(MessageType::InfoResponse, text)
    }

    pub fn data_response(text: impl Into<String>) -> Self {
        Self::new(MessageType::DataResponse, text)
    }

    pub fn unknown_response(text: impl Into<String>) -> Self {
        Self::new(MessageType::UnknownResponse, text)
    }

    pub fn kind(&self) -> &MessageType {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
