//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (Axum router, TLS serving, drain on shutdown)
//!     → websocket.rs (handshake validation, origin admission, upgrade)
//!     → session layer
//! ```

pub mod server;
pub mod websocket;

pub use server::{GatewayServer, RuntimeState, ServerError};
pub use websocket::{UpgradeError, Upgrader};
