//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{CHUNK_REQUESTS_TOTAL, CHUNK_REQUEST_LATENCY, RECIPIENTS_TOTAL, SENDS_TOTAL};
use crate::error::GcmError;

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording gateway metrics
pub struct GatewayMetrics;

impl GatewayMetrics {
    /// Record a chunk request that produced an HTTP status
    pub fn record_chunk_status(status: u16, elapsed_secs: f64) {
        let class = match status {
            200..=299 => "2xx",
            400..=499 => "4xx",
            500..=599 => "5xx",
            _ => "other",
        };
        CHUNK_REQUESTS_TOTAL.with_label_values(&[class]).inc();
        CHUNK_REQUEST_LATENCY.observe(elapsed_secs);
    }

    /// Record a chunk request that failed before a status was received
    pub fn record_chunk_transport_error(elapsed_secs: f64) {
        CHUNK_REQUESTS_TOTAL.with_label_values(&["transport"]).inc();
        CHUNK_REQUEST_LATENCY.observe(elapsed_secs);
    }

    /// Record recipients handed to the dispatcher
    pub fn record_recipients(count: usize) {
        RECIPIENTS_TOTAL.inc_by(count as u64);
    }

    /// Record the outcome of a whole send
    pub fn record_send<T>(result: &Result<T, GcmError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        SENDS_TOTAL.with_label_values(&[outcome]).inc();
    }
}
