//! Metrics and observability utilities
//!
//! Prometheus metrics for the answer pipeline with standardized naming.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all AnswerForge metrics
pub const METRICS_PREFIX: &str = "answerforge";

/// Histogram buckets for request and resolution latency (in seconds).
/// FAQ answers land in the first buckets, remote answers in the last ones.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Resolution metrics
    describe_counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        Unit::Count,
        "Total resolved questions, by answering tier"
    );

    describe_histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end resolution latency in seconds"
    );

    describe_counter!(
        format!("{}_faq_hits_total", METRICS_PREFIX),
        Unit::Count,
        "FAQ lookups that found an answer"
    );

    describe_counter!(
        format!("{}_faq_misses_total", METRICS_PREFIX),
        Unit::Count,
        "FAQ lookups that found nothing"
    );

    describe_histogram!(
        format!("{}_local_confidence", METRICS_PREFIX),
        Unit::Count,
        "Confidence scores of local model candidates"
    );

    // Generator metrics
    describe_counter!(
        format!("{}_generator_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generator calls"
    );

    describe_histogram!(
        format!("{}_generator_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generator latency in seconds"
    );

    describe_counter!(
        format!("{}_generator_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total generator failures (including timeouts)"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a completed resolution
pub fn record_resolution(duration_secs: f64, tier: &str) {
    counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        "tier" => tier.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        "tier" => tier.to_string()
    )
    .record(duration_secs);
}

/// Helper to record FAQ lookups
pub fn record_faq_lookup(hit: bool) {
    if hit {
        counter!(format!("{}_faq_hits_total", METRICS_PREFIX)).increment(1);
    } else {
        counter!(format!("{}_faq_misses_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record the score of a local candidate
pub fn record_local_confidence(score: f64) {
    histogram!(format!("{}_local_confidence", METRICS_PREFIX)).record(score);
}

/// Helper to record generator metrics
pub fn record_generator(duration_secs: f64, tier: &str, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generator_requests_total", METRICS_PREFIX),
        "tier" => tier.to_string(),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generator_duration_seconds", METRICS_PREFIX),
            "tier" => tier.to_string(),
            "model" => model.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_generator_errors_total", METRICS_PREFIX),
            "tier" => tier.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Buckets must be strictly increasing
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // Remote timeout default (30s) should be covered
        assert_eq!(LATENCY_BUCKETS.last(), Some(&30.0));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/chat");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }

    #[test]
    fn test_recorders_without_exporter() {
        record_resolution(0.01, "FAQ");
        record_faq_lookup(true);
        record_faq_lookup(false);
        record_local_confidence(0.42);
        record_generator(1.5, "remote", "compound-beta-mini", false);
    }
}
