//! Retry metrics.
//!
//! # Metrics
//! - `kv_attempts_total` (counter): every attempt, by operation
//! - `kv_retries_total` (counter): attempts followed by a backoff wait
//! - `kv_failures_total` (counter): failed attempts, by operation and class
//! - `kv_degraded_reads_total` (counter): reads answered empty after exhaustion

use crate::resilience::classify::ErrorClass;

pub fn record_attempt(operation: &str) {
    metrics::counter!("kv_attempts_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_retry(operation: &str) {
    metrics::counter!("kv_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_failure(operation: &str, class: ErrorClass) {
    metrics::counter!(
        "kv_failures_total",
        "operation" => operation.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

pub fn record_degraded_read(operation: &str) {
    metrics::counter!("kv_degraded_reads_total", "operation" => operation.to_string())
        .increment(1);
}
