//! Remote service metrics.
//!
//! - Request counters by operation and status
//! - Latency histograms

use metrics::{counter, histogram};

pub mod names {
    /// Total remote requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "remediation_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "remediation_request_latency_seconds";
}

/// Record metrics for a completed remote request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::LATENCY_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("blur", 200, 12.0);
    }
}
