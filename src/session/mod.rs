//! Connection session subsystem.
//!
//! # Data Flow
//! ```text
//! upgraded channel
//!     → factory.rs (split + bind fresh Sender/Receiver/Dispatcher)
//!     → handler.rs loop: receive → process → send → receive ...
//!     → first failure: classify.rs (peer close vs other error)
//!     → best-effort close/error notification → release channel
//!
//! Session States:
//!     Open → Closing → Closed
//! ```
//!
//! # Design Decisions
//! - Every failure ends the session; nothing is retried
//! - Only the close/error notification is best-effort
//! - Channel release happens exactly once, on every exit path

pub mod classify;
pub mod factory;
pub mod handler;

pub use classify::{classify, classify_close_code, Disposition};
pub use factory::{SessionFactory, WsSession};
pub use handler::{Phase, Session, SessionReport, SessionState, Termination};
