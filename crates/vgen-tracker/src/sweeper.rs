//! Background expiry of cached asset events.
//!
//! Events for assets nobody ever waits on would otherwise stay in memory
//! until the next `resolve` call purges them.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::tracker::AssetTracker;

/// Periodically purges expired entries from the tracker's event cache.
pub struct CachedEventSweeper {
    tracker: AssetTracker,
    interval: Duration,
}

impl CachedEventSweeper {
    pub fn new(tracker: AssetTracker) -> Self {
        let configured = tracker.config().sweep_interval;
        let interval = if configured.is_zero() {
            TrackerConfig::default().sweep_interval
        } else {
            configured
        };
        Self { tracker, interval }
    }

    /// Override the sweep interval. Zero is ignored.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.interval = interval;
        }
        self
    }

    /// Start the sweep loop.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(self) {
        info!("Starting cached asset event sweeper (interval: {:?})", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep_once();
        }
    }

    /// Run a single sweep (for testing or manual invocation).
    pub fn sweep_once(&self) -> usize {
        let purged = self.tracker.purge_expired();
        if purged > 0 {
            info!(purged, "Expired cached asset events nobody waited for");
        } else {
            debug!("No expired asset events");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::AssetEvent;

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_purges_expired_events() {
        let tracker = AssetTracker::new(
            TrackerConfig::default().with_event_ttl(Duration::from_secs(10)),
        );
        tracker.resolve(AssetEvent::ready("orphan", None));

        let sweeper = CachedEventSweeper::new(tracker.clone()).with_interval(Duration::from_secs(5));
        let handle = tokio::spawn(sweeper.run());

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(tracker.stats().cached_events, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_once_keeps_fresh_events() {
        let tracker = AssetTracker::default();
        tracker.resolve(AssetEvent::ready("fresh", None));

        let sweeper = CachedEventSweeper::new(tracker.clone());
        assert_eq!(sweeper.sweep_once(), 0);
        assert_eq!(tracker.stats().cached_events, 1);
    }

    #[test]
    fn test_zero_interval_is_ignored() {
        let mut config = TrackerConfig::default();
        config.sweep_interval = Duration::ZERO;

        let sweeper = CachedEventSweeper::new(AssetTracker::new(config));
        assert_eq!(sweeper.interval, Duration::from_secs(60));

        let sweeper = sweeper.with_interval(Duration::ZERO);
        assert_eq!(sweeper.interval, Duration::from_secs(60));
    }
}
