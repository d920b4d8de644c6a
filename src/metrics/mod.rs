//! Prometheus metrics for gateway traffic.
//!
//! - Send outcomes (one per `send` call, labelled by result code)
//! - Chunk request outcomes and latency
//! - Recipients submitted

mod helpers;

pub use helpers::{encode_metrics, GatewayMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "gcm";

lazy_static! {
    /// Total `send` calls by outcome ("ok" or an error code)
    pub static ref SENDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sends_total", METRIC_PREFIX),
        "Total batched sends by outcome",
        &["outcome"]
    ).unwrap();

    /// Total chunk requests by outcome (HTTP status class or "transport")
    pub static ref CHUNK_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_chunk_requests_total", METRIC_PREFIX),
        "Total gateway chunk requests by outcome",
        &["outcome"]
    ).unwrap();

    /// Total registration ids submitted to the gateway
    pub static ref RECIPIENTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_recipients_total", METRIC_PREFIX),
        "Total registration ids submitted"
    ).unwrap();

    /// Latency of a single chunk request
    pub static ref CHUNK_REQUEST_LATENCY: Histogram = register_histogram!(
        format!("{}_chunk_request_latency_seconds", METRIC_PREFIX),
        "Gateway chunk request latency in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
}
