//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Request outcomes and selected plans
//! - Per-step durations (probe, fetch, transcode, publish)
//! - Duration probe misses

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Requests
// =============================================================================

/// Processed requests by outcome.
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelpush_requests_total", "Processed upload requests"),
        &["outcome"], // "success", "validation", "fetch", "transcode", "publish", "io"
    )
    .unwrap()
});

/// Selected transform plans by kind.
pub static PLANS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelpush_plans_total", "Transform plans selected"),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Steps
// =============================================================================

/// Duration of each processing step in seconds.
pub static STEP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelpush_step_duration_seconds",
            "Duration of a processing step",
        )
        .buckets(vec![
            0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["step"], // "probe", "fetch", "transcode", "publish"
    )
    .unwrap()
});

/// Duration probes that produced no usable value.
pub static PROBE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelpush_probe_failures_total",
        "Duration probes that returned no duration",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REQUESTS_TOTAL.clone()),
        Box::new(PLANS_TOTAL.clone()),
        Box::new(STEP_DURATION.clone()),
        Box::new(PROBE_FAILURES.clone()),
    ]
}
