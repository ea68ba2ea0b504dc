//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, paths non-empty)
//! - Reject origin rules that would silently deny everything
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    if !config.websocket.path.starts_with('/') {
        errors.push(ValidationError::new("websocket.path", "must start with '/'"));
    }

    for (i, origin) in config.websocket.forbidden_origins.iter().enumerate() {
        if origin.is_empty() {
            errors.push(ValidationError::new(
                format!("websocket.forbidden_origins[{}]", i),
                "empty entry would reject every origin",
            ));
        }
    }

    if config.tls.cert_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("tls.cert_path", "certificate path is required"));
    }
    if config.tls.key_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("tls.key_path", "key path is required"));
    }

    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::new("shutdown.grace_period_secs", "must be greater than 0"));
    }
    if config.shutdown.close_timeout_ms == 0 {
        errors.push(ValidationError::new("shutdown.close_timeout_ms", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address (e.g. 0.0.0.0:9090)",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
