//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_handshakes_total` (counter): upgrade attempts by outcome
//! - `gateway_active_sessions` (gauge): sessions currently open
//! - `gateway_sessions_closed_total` (counter): closed sessions by termination
//! - `gateway_messages_total` (counter): inbound messages by kind

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::protocol::MessageType;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_handshake(outcome: &'static str) {
    counter!("gateway_handshakes_total", "outcome" => outcome).increment(1);
}

pub fn session_opened() {
    gauge!("gateway_active_sessions").increment(1.0);
}

pub fn session_closed(termination: &'static str) {
    gauge!("gateway_active_sessions").decrement(1.0);
    counter!("gateway_sessions_closed_total", "termination" => termination).increment(1);
}

pub fn record_message(kind: &MessageType) {
    // Raw unrecognized tags would make the label set unbounded.
    let label = match kind {
        MessageType::Error => "error",
        MessageType::Info => "info",
        MessageType::Data => "data",
        MessageType::Unrecognized(_) => "unrecognized",
        _ => "response_kind",
    };
    counter!("gateway_messages_total", "kind" => label).increment(1);
}
