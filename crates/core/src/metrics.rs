//! Prometheus metrics for the publish pipeline.
//!
//! The server registers these through [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Publish requests by outcome.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("beatpub_publish_attempts_total", "Total publish requests"),
        &["result"], // "success", "validation", "download", "publish", "unexpected"
    )
    .unwrap()
});

/// End-to-end publish duration in seconds.
pub static PUBLISH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "beatpub_publish_duration_seconds",
            "Duration of a publish request",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Sequencer failures by the stage that was being left.
pub static STAGE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "beatpub_stage_failures_total",
            "Publish sequencer failures by stage",
        ),
        &["stage"],
    )
    .unwrap()
});

/// Asset bytes written to scratch storage.
pub static FETCHED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "beatpub_fetched_bytes_total",
        "Total asset bytes downloaded",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PUBLISH_ATTEMPTS.clone()),
        Box::new(PUBLISH_DURATION.clone()),
        Box::new(STAGE_FAILURES.clone()),
        Box::new(FETCHED_BYTES.clone()),
    ]
}
