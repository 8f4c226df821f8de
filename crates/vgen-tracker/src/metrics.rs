//! Metrics recorded by the tracker.
//!
//! Uses the `metrics` facade; nothing is exported unless the host process
//! installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const ASSET_WAITS_TOTAL: &str = "vgen_asset_waits_total";
    pub const ASSET_WAIT_DURATION_SECONDS: &str = "vgen_asset_wait_duration_seconds";
    pub const ASSET_EVENTS_TOTAL: &str = "vgen_asset_events_total";
    pub const ASSET_EVENTS_EXPIRED_TOTAL: &str = "vgen_asset_events_expired_total";
    pub const ASSET_EVENTS_MALFORMED_TOTAL: &str = "vgen_asset_events_malformed_total";
    pub const ASSET_POLLS_TOTAL: &str = "vgen_asset_polls_total";
}

/// Record the outcome of a wait (broker or poller).
pub fn record_wait(source: &'static str, outcome: &'static str, duration_secs: f64) {
    let labels = [("source", source), ("outcome", outcome)];
    counter!(names::ASSET_WAITS_TOTAL, &labels).increment(1);
    histogram!(names::ASSET_WAIT_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a terminal event handed to the broker.
pub fn record_event(kind: &'static str, delivery: &'static str) {
    let labels = [("kind", kind), ("delivery", delivery)];
    counter!(names::ASSET_EVENTS_TOTAL, &labels).increment(1);
}

pub fn record_events_expired(count: usize) {
    counter!(names::ASSET_EVENTS_EXPIRED_TOTAL).increment(count as u64);
}

pub fn record_malformed_event() {
    counter!(names::ASSET_EVENTS_MALFORMED_TOTAL).increment(1);
}

/// Record one status query made by the poller.
pub fn record_poll(result: &'static str) {
    let labels = [("result", result)];
    counter!(names::ASSET_POLLS_TOTAL, &labels).increment(1);
}
