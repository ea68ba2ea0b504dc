//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upgrade request:
//!     → origin.rs (Origin header against debug flag + deny-list)
//!     → Pass to the upgrader (admitted) or 403 (refused)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or unreadable Origin is refused
//! - Policy is immutable after construction and shared read-only
//! - Deny-list matching is substring containment, not host equality

pub mod origin;

pub use origin::OriginGuard;
