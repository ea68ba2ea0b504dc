//! Message channel endpoints and dispatch.
//!
//! # Data Flow
//! ```text
//! upgraded channel ──split──▶ receiver.rs (frames → Message)
//!                                  │
//!                                  ▼
//!                             dispatcher.rs (Message → response Message)
//!                                  │
//!                                  ▼
//!                  ◀────────── sender.rs (Message → frame, close frames)
//! ```
//!
//! # Design Decisions
//! - Endpoints are constructed already bound to their half of the channel;
//!   there is no "unbound" state to guard against
//! - Sender takes `&mut self`, so writes on one channel never interleave
//! - Dispatcher holds no channel and cannot fail

pub mod dispatcher;
pub mod error;
pub mod receiver;
pub mod sender;

pub use dispatcher::Dispatcher;
pub use error::ChannelError;
pub use receiver::Receiver;
pub use sender::Sender;
