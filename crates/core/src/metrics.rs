//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search pipeline (searches, cache, matches)
//! - Ruleset index refreshes
//! - External services (content search, ruleset metadata, episode lookup)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Search Pipeline Metrics
// =============================================================================

/// Searches total by mode and result.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediathekarr_searches_total", "Total Newznab searches"),
        &["mode", "result"], // result: "ok", "degraded", "error"
    )
    .unwrap()
});

/// Result cache lookups by outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediathekarr_result_cache_lookups_total",
            "Result cache lookups",
        ),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

/// Matches produced, by strategy.
pub static MATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediathekarr_matches_total",
            "Items matched to an episode, by strategy",
        ),
        &["strategy"],
    )
    .unwrap()
});

/// Entries emitted per search.
pub static RESULT_ENTRIES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediathekarr_result_entries",
            "Number of result entries emitted per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Ruleset Metrics
// =============================================================================

/// Ruleset refreshes by result.
pub static RULESET_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediathekarr_ruleset_refreshes_total",
            "Ruleset index refreshes",
        ),
        &["trigger", "result"], // trigger: "startup", "search", "timer"; result: "success", "error"
    )
    .unwrap()
});

/// Rulesets in the currently published index.
pub static RULESETS_LOADED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediathekarr_rulesets_loaded",
        "Number of rulesets in the published index",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediathekarr_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediathekarr_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome of one external call.
pub(crate) fn record_external_call(service: &str, operation: &str, seconds: f64, ok: bool) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(seconds);
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if ok { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(MATCHES_TOTAL.clone()),
        Box::new(RESULT_ENTRIES.clone()),
        // Rulesets
        Box::new(RULESET_REFRESHES.clone()),
        Box::new(RULESETS_LOADED.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
