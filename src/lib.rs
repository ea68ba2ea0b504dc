//! TLS WebSocket Messaging Gateway Library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod messaging;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod security;
pub mod session;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use protocol::{Message, MessageType};
