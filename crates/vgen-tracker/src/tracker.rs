//! Readiness broker.
//!
//! Pairs terminal asset events (pushed by the webhook route) with callers
//! waiting for the same asset. Either side may arrive first:
//!
//! - event first: the event is cached and the next `wait` consumes it
//!   without suspending
//! - wait first: a registration is created and the caller suspends until
//!   `resolve` hands it the event or its deadline passes
//!
//! A single mutex guards both the waiter map and the event cache, so the
//! cache check and the registration insert are one atomic step with respect
//! to `resolve`. The lock is never held across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vgen_models::{AssetEvent, AssetId, ReadyAsset};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::metrics;

/// Counts exposed on the readiness endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub pending_waiters: usize,
    pub cached_events: usize,
}

/// A suspended caller.
struct Waiter {
    token: u64,
    tx: oneshot::Sender<AssetEvent>,
}

/// An event that arrived before anyone waited for it.
struct CachedEvent {
    event: AssetEvent,
    stored_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct Registry {
    waiters: HashMap<AssetId, Waiter>,
    events: HashMap<AssetId, CachedEvent>,
}

impl Registry {
    fn purge_expired(&mut self, ttl: Duration, now: Instant) -> usize {
        let before = self.events.len();
        self.events
            .retain(|_, cached| now.saturating_duration_since(cached.stored_at) < ttl);
        before - self.events.len()
    }

    /// Hand an event to the registered waiter, or cache it if there is none.
    ///
    /// The send happens under the caller's lock, so a waiter that is removed
    /// here always finds the event on its channel.
    fn deliver(&mut self, event: AssetEvent, seq: u64, max_cached: usize) -> Delivery {
        match self.waiters.remove(event.asset_id()) {
            Some(waiter) => match waiter.tx.send(event) {
                Ok(()) => Delivery::Delivered,
                Err(event) => {
                    self.store(event, seq, max_cached);
                    Delivery::Orphaned
                }
            },
            None => Delivery::Cached {
                replaced: self.store(event, seq, max_cached),
            },
        }
    }

    /// Cache an event, replacing any previous one for the same asset.
    /// Returns true when an older event was overwritten.
    fn store(&mut self, event: AssetEvent, seq: u64, max_cached: usize) -> bool {
        let asset_id = event.asset_id().clone();
        let cached = CachedEvent {
            event,
            stored_at: Instant::now(),
            seq,
        };
        let replaced = self.events.insert(asset_id, cached).is_some();

        if self.events.len() > max_cached {
            let overflow = self.events.len() - max_cached;
            let mut by_age: Vec<(u64, AssetId)> = self
                .events
                .iter()
                .map(|(id, cached)| (cached.seq, id.clone()))
                .collect();
            by_age.sort_unstable_by_key(|(seq, _)| *seq);
            for (_, id) in by_age.into_iter().take(overflow) {
                self.events.remove(&id);
            }
            warn!(
                evicted = overflow,
                max_cached, "Asset event cache exceeded capacity, evicted oldest entries"
            );
        }

        replaced
    }
}

struct TrackerInner {
    registry: Mutex<Registry>,
    config: TrackerConfig,
    next_seq: AtomicU64,
}

impl TrackerInner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panic while holding the lock cannot leave the maps half-updated:
        // every critical section is a single insert/remove.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

/// Outcome of the atomic check-cache-or-register step.
enum Registration<'a> {
    Cached(AssetEvent),
    Pending(WaiterGuard<'a>),
}

/// Owns a waiter's receiving end and withdraws its registration when the
/// waiting future finishes or is dropped.
struct WaiterGuard<'a> {
    inner: &'a TrackerInner,
    asset_id: AssetId,
    token: u64,
    rx: oneshot::Receiver<AssetEvent>,
}

impl WaiterGuard<'_> {
    /// Remove the registration if it still belongs to this waiter.
    ///
    /// Returns false when a resolver already took it, in which case the
    /// event has been sent on the channel.
    fn withdraw(&self) -> bool {
        Self::withdraw_locked(&mut self.inner.lock(), &self.asset_id, self.token)
    }

    fn withdraw_locked(registry: &mut Registry, asset_id: &AssetId, token: u64) -> bool {
        match registry.waiters.get(asset_id) {
            Some(waiter) if waiter.token == token => {
                registry.waiters.remove(asset_id);
                true
            }
            _ => false,
        }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let inner = self.inner;
        let mut registry = inner.lock();

        if Self::withdraw_locked(&mut registry, &self.asset_id, self.token) {
            debug!(asset_id = %self.asset_id, "Asset waiter withdrawn before resolution");
            return;
        }

        // Delivered but never read: the caller left after the send. Pass it
        // on under the same lock so a waiter registered since then gets it.
        if let Ok(event) = self.rx.try_recv() {
            let seq = inner.next_seq();
            let delivery = registry.deliver(event, seq, inner.config.max_cached_events);
            debug!(
                asset_id = %self.asset_id,
                handed_over = matches!(delivery, Delivery::Delivered),
                "Asset waiter dropped after delivery, passed event on"
            );
        }
    }
}

/// How `resolve` disposed of an event.
enum Delivery {
    Delivered,
    Cached { replaced: bool },
    /// The waiter went away between registration and delivery.
    Orphaned,
}

/// In-memory readiness broker.
///
/// Cloning is cheap; all clones share the same registry. Create one per
/// process at startup and hand clones to every task that waits or resolves.
#[derive(Clone)]
pub struct AssetTracker {
    inner: Arc<TrackerInner>,
}

impl Default for AssetTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl AssetTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                registry: Mutex::new(Registry::default()),
                config,
                next_seq: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Wait for an asset with the configured default timeout.
    pub async fn wait(&self, asset_id: &AssetId) -> TrackerResult<ReadyAsset> {
        self.wait_with_timeout(asset_id, self.inner.config.wait_timeout)
            .await
    }

    /// Wait until the asset's terminal event arrives or `timeout` elapses.
    ///
    /// A cached event is consumed immediately. Fails with
    /// `AssetProcessingFailed` for an errored asset, `WaitTimedOut` when the
    /// deadline passes, `AlreadyWaiting` if another caller is waiting on the
    /// same asset, and `InvalidArgument` for an empty id.
    pub async fn wait_with_timeout(
        &self,
        asset_id: &AssetId,
        timeout: Duration,
    ) -> TrackerResult<ReadyAsset> {
        if asset_id.is_empty() {
            return Err(TrackerError::invalid_argument(
                "Cannot wait for asset readiness without an asset id.",
            ));
        }

        let started = Instant::now();

        let mut guard = match self.register(asset_id)? {
            Registration::Cached(event) => {
                debug!(asset_id = %asset_id, kind = event.kind(), "Consumed cached asset event");
                return Self::finish("cached", started, event);
            }
            Registration::Pending(guard) => guard,
        };

        debug!(asset_id = %asset_id, timeout_ms = timeout.as_millis() as u64, "Waiting for asset");

        let event = match tokio::time::timeout(timeout, &mut guard.rx).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => {
                // Senders are only dropped after a send, so this means the
                // registry itself went away.
                warn!(asset_id = %asset_id, "Asset waiter channel closed without an event");
                return Self::timed_out(asset_id, timeout, started);
            }
            Err(_) => {
                if guard.withdraw() {
                    return Self::timed_out(asset_id, timeout, started);
                }
                // A resolver won the race for the registration; the event
                // was sent under the lock before it was released.
                match guard.rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => return Self::timed_out(asset_id, timeout, started),
                }
            }
        };

        Self::finish("webhook", started, event)
    }

    /// Atomically consume a cached event or register a new waiter.
    fn register(&self, asset_id: &AssetId) -> TrackerResult<Registration<'_>> {
        let inner = &*self.inner;
        let mut registry = inner.lock();

        if let Some(cached) = registry.events.remove(asset_id) {
            return Ok(Registration::Cached(cached.event));
        }

        if registry.waiters.contains_key(asset_id) {
            return Err(TrackerError::AlreadyWaiting(asset_id.clone()));
        }

        let token = inner.next_seq();
        let (tx, rx) = oneshot::channel();
        registry.waiters.insert(asset_id.clone(), Waiter { token, tx });

        Ok(Registration::Pending(WaiterGuard {
            inner,
            asset_id: asset_id.clone(),
            token,
            rx,
        }))
    }

    /// Deliver a terminal event.
    ///
    /// Wakes the registered waiter if there is one, otherwise caches the
    /// event for the next `wait` (replacing any earlier unconsumed event for
    /// the same asset). Events without an asset id are dropped.
    pub fn resolve(&self, event: AssetEvent) {
        let asset_id = event.asset_id().clone();
        let kind = event.kind();

        if asset_id.is_empty() {
            warn!(kind, "Dropping malformed asset event without an asset id");
            metrics::record_malformed_event();
            return;
        }

        let inner = &*self.inner;
        let seq = inner.next_seq();
        let (delivery, expired) = {
            let mut registry = inner.lock();
            let expired = registry.purge_expired(inner.config.event_ttl, Instant::now());

            let delivery = registry.deliver(event, seq, inner.config.max_cached_events);
            (delivery, expired)
        };

        if expired > 0 {
            metrics::record_events_expired(expired);
        }

        match delivery {
            Delivery::Delivered => {
                info!(asset_id = %asset_id, kind, "Delivered asset event to waiter");
                metrics::record_event(kind, "delivered");
            }
            Delivery::Cached { replaced } => {
                info!(asset_id = %asset_id, kind, replaced, "Cached asset event for a later wait");
                metrics::record_event(kind, "cached");
            }
            Delivery::Orphaned => {
                debug!(asset_id = %asset_id, kind, "Asset waiter gone before delivery, cached event");
                metrics::record_event(kind, "cached");
            }
        }
    }

    /// Fail an asset through a channel other than a platform event.
    pub fn reject_asset(&self, asset_id: &AssetId, reason: impl Into<String>) {
        self.resolve(AssetEvent::errored(asset_id.clone(), reason));
    }

    /// Drop cached events older than the configured TTL.
    pub fn purge_expired(&self) -> usize {
        let purged = self
            .inner
            .lock()
            .purge_expired(self.inner.config.event_ttl, Instant::now());
        if purged > 0 {
            metrics::record_events_expired(purged);
        }
        purged
    }

    pub fn is_waiting(&self, asset_id: &AssetId) -> bool {
        self.inner.lock().waiters.contains_key(asset_id)
    }

    pub fn stats(&self) -> TrackerStats {
        let registry = self.inner.lock();
        TrackerStats {
            pending_waiters: registry.waiters.len(),
            cached_events: registry.events.len(),
        }
    }

    #[cfg(test)]
    fn has_cached_event(&self, asset_id: &AssetId) -> bool {
        self.inner.lock().events.contains_key(asset_id)
    }

    fn finish(
        source: &'static str,
        started: Instant,
        event: AssetEvent,
    ) -> TrackerResult<ReadyAsset> {
        let elapsed = started.elapsed().as_secs_f64();
        match event {
            AssetEvent::Ready {
                asset_id,
                playback_id,
            } => {
                metrics::record_wait(source, "ready", elapsed);
                Ok(ReadyAsset {
                    asset_id,
                    playback_id,
                })
            }
            AssetEvent::Errored { asset_id, reason } => {
                metrics::record_wait(source, "errored", elapsed);
                warn!(asset_id = %asset_id, reason = %reason, "Asset failed while processing");
                Err(TrackerError::AssetProcessingFailed { asset_id, reason })
            }
        }
    }

    fn timed_out(
        asset_id: &AssetId,
        timeout: Duration,
        started: Instant,
    ) -> TrackerResult<ReadyAsset> {
        metrics::record_wait("webhook", "timed_out", started.elapsed().as_secs_f64());
        warn!(asset_id = %asset_id, timeout_ms = timeout.as_millis() as u64, "Timed out waiting for asset");
        Err(TrackerError::timed_out(asset_id, timeout, None))
    }
}
