//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load TLS material → Build server → Accept sessions
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Begin graceful shutdown
//!
//! Shutdown (http::server + shutdown.rs):
//!     Stop accepting → Drain sessions (grace period) → Force-close the rest → Stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown has a deadline: sessions left after the grace period are closed

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{shutdown_signal, TerminationSignals};
pub use startup::StartupError;
