//! Tracker and poller configuration.

use std::time::Duration;

/// Readiness broker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Default deadline for `wait`
    pub wait_timeout: Duration,
    /// How long an event nobody waited for stays cached
    pub event_ttl: Duration,
    /// Upper bound on cached events; the oldest are evicted beyond it
    pub max_cached_events: usize,
    /// Interval of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(120),
            event_ttl: Duration::from_secs(600), // 10 minutes
            max_cached_events: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            wait_timeout: Duration::from_secs(
                std::env::var("ASSET_WAIT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            event_ttl: Duration::from_secs(
                std::env::var("ASSET_EVENT_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            max_cached_events: std::env::var("ASSET_EVENT_CACHE_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(10_000),
            sweep_interval: Duration::from_secs(
                std::env::var("ASSET_EVENT_SWEEP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&n: &u64| n > 0)
                    .unwrap_or(60),
            ),
        }
    }

    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub fn with_event_ttl(mut self, event_ttl: Duration) -> Self {
        self.event_ttl = event_ttl;
        self
    }

    pub fn with_max_cached_events(mut self, max_cached_events: usize) -> Self {
        self.max_cached_events = max_cached_events.max(1);
        self
    }
}

/// Polling fallback configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between status queries
    pub interval: Duration,
    /// Overall deadline
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(120),
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_millis(
                std::env::var("ASSET_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&n: &u64| n > 0)
                    .unwrap_or(3000),
            ),
            timeout: Duration::from_secs(
                std::env::var("ASSET_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    /// A zero interval falls back to the default rather than busy-polling.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        let interval = if interval.is_zero() {
            Self::default().interval
        } else {
            interval
        };
        Self { interval, timeout }
    }
}
