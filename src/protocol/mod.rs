//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound frame (text or binary)
//!     → codec.rs (JSON → Message)
//!     → message.rs (closed MessageType, immutable Message)
//!
//! Outbound Message
//!     → codec.rs (Message → JSON text frame)
//! ```
//!
//! # Wire Format
//! One JSON object per frame: `{"type": <tag>, "text": <string>}`.
//!
//! # Design Decisions
//! - Unknown tags decode to `MessageType::Unrecognized`, never to an error
//! - Malformed payloads (bad JSON, missing `type`) do fail decoding
//! - `text` is opaque and passed through untouched

pub mod codec;
pub mod message;

pub use codec::{decode, decode_bytes, encode, CodecError};
pub use message::{Message, MessageType};
