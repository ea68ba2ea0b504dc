//! Maps inbound messages to their canned responses.

use std::sync::Arc;

use crate::config::ResponseTexts;
use crate::protocol::{Message, MessageType};

/// Stateless inbound → outbound mapping.
///
/// | inbound        | outbound           |
/// |----------------|--------------------|
/// | `error`        | `error_response`   |
/// | `info`         | `info_response`    |
/// | `data`         | `data_response`    |
/// | anything else  | `unknown_response` |
///
/// Response texts come from configuration; the inbound text only appears in
/// the audit log.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    responses: Arc<ResponseTexts>,
}

impl Dispatcher {
    pub fn new(responses: Arc<ResponseTexts>) -> Self {
        Self { responses }
    }

    /// Produce the response for one inbound message.
    pub fn process(&self, message: &Message) -> Message {
        match message.kind() {
            MessageType::Error => {
                tracing::warn!(text = %message.text(), "Client reported an error");
                Message::error_response(self.responses.error.as_str())
            }
            MessageType::Info => {
                tracing::info!(text = %message.text(), "Info message received");
                Message::info_response(self.responses.info.as_str())
            }
            MessageType::Data => {
                tracing::info!(text = %message.text(), "Data message received");
                Message::data_response(self.responses.data.as_str())
            }
            // Response kinds are never valid inbound.
            MessageType::ErrorResponse
            | MessageType::InfoResponse
            | MessageType::DataResponse
            | MessageType::UnknownResponse
            | MessageType::Unrecognized(_) => {
                tracing::warn!(tag = %message.kind(), "Unknown message type");
                Message::unknown_response(self.responses.unknown.as_str())
            }
        }
    }
}
