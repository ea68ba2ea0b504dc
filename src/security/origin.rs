//! Origin admission control for upgrade requests.
//!
//! A request is refused when its `Origin` header contains any configured
//! forbidden substring. Matching is plain substring containment, so
//! forbidding `"evil.com"` also refuses `"https://notevil.com"`. Entries must
//! be chosen with that in mind; this is not suffix or host matching.
//!
//! An empty entry would match every origin. Configuration validation rejects
//! such entries, so the guard never sees one from a loaded config.

use crate::config::WebSocketConfig;

/// Decides whether an upgrade request's origin is acceptable.
#[derive(Debug, Clone, Default)]
pub struct OriginGuard {
    debug: bool,
    forbidden: Vec<String>,
}

impl OriginGuard {
    /// Create a guard. With `debug` set every origin is admitted.
    pub fn new(debug: bool, forbidden: Vec<String>) -> Self {
        Self { debug, forbidden }
    }

    pub fn from_config(config: &WebSocketConfig) -> Self {
        Self::new(config.debug, config.forbidden_origins.clone())
    }

    /// Returns `true` if a handshake carrying this `Origin` value may proceed.
    pub fn allow(&self, origin: &str) -> bool {
        if self.debug {
            return true;
        }
        if origin.is_empty() {
            return false;
        }
        !self
            .forbidden
            .iter()
            .any(|blocked| origin.contains(blocked.as_str()))
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}
