//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Kit adapter metrics
    pub static ref KIT_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("howdy_kit_requests_total", "Total number of Kit API requests"),
        &["endpoint", "status"]
    ).expect("metric can be created");
    pub static ref SYNC_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("howdy_sync_total", "Total number of subscriber sync attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("howdy_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(KIT_REQUESTS_TOTAL.clone()))
        .expect("KIT_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_TOTAL.clone()))
        .expect("SYNC_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record the outcome of one subscriber sync attempt.
pub fn observe_sync(outcome: &str) {
    SYNC_TOTAL.with_label_values(&[outcome]).inc();
}
