//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (TLS 1.2/1.3 handshake, ALPN http/1.1)
//!     → HTTP upgrade (http::websocket)
//!     → connection.rs (session identity, drain tracking)
//! ```

pub mod connection;
pub mod tls;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use tls::{load_tls_config, TlsError};
