//! Sliding-window limiter backed by a sharded map

use super::types::{Admission, Identity, PlanTier};
use crate::config::RateLimitSettings;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Process-local sliding-window rate limiter.
///
/// Records are sharded by identity, so callers with different identities
/// never wait on each other. The prune, check and append steps for one
/// identity happen under that identity's shard guard, which makes
/// concurrent requests from the same identity serialize instead of both
/// observing a free slot.
///
/// Going over `max_identities` triggers one eviction pass that shrinks the
/// map to 90% of the cap, so the full scan is paid once per tenth of the cap
/// in new identities rather than on every admission.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    settings: RateLimitSettings,
    pub(super) records: DashMap<Identity, VecDeque<Instant>>,
    evicting: AtomicBool,
    pub(super) capacity_passes: AtomicUsize,
}

impl SlidingWindowLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            records: DashMap::new(),
            evicting: AtomicBool::new(false),
            capacity_passes: AtomicUsize::new(0),
        }
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Number of identities currently holding a record
    pub fn tracked_identities(&self) -> usize {
        self.records.len()
    }

    /// Check and consume one slot for `identity` at the current instant
    pub fn admit(&self, identity: &Identity, plan: PlanTier) -> Admission {
        self.admit_at(identity, plan, Instant::now())
    }

    /// Check and consume one slot for `identity` as of `now`
    pub fn admit_at(&self, identity: &Identity, plan: PlanTier, now: Instant) -> Admission {
        let Some(limit) = self.settings.limits.limit_for(plan) else {
            return Admission::Allowed;
        };
        let window = self.settings.window;

        let admission = {
            let mut record = self.records.entry(identity.clone()).or_default();
            let stamps = record.value_mut();
            prune(stamps, now, window);

            if stamps.len() >= limit as usize {
                let retry_after_secs = stamps
                    .front()
                    .map(|oldest| retry_after(*oldest + window, now))
                    .unwrap_or(1);
                Admission::Denied { retry_after_secs }
            } else {
                // Keep the record ordered even if callers pass a stale `now`
                let stamp = stamps.back().map_or(now, |last| now.max(*last));
                stamps.push_back(stamp);
                Admission::Allowed
            }
        };

        if let Admission::Denied { retry_after_secs } = admission {
            debug!(%identity, %plan, retry_after_secs, "admission denied");
        }

        if self.records.len() > self.settings.max_identities {
            self.enforce_capacity(identity, now);
        }

        admission
    }

    /// Drop every identity with no timestamp left inside the window.
    ///
    /// Returns the number of identities removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.settings.window;
        let before = self.records.len();
        self.records.retain(|_, stamps| {
            prune(stamps, now, window);
            !stamps.is_empty()
        });
        before.saturating_sub(self.records.len())
    }

    /// Run [`sweep`](Self::sweep) periodically until `token` is cancelled
    pub fn spawn_sweeper(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = self.settings.sweep_interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("rate limiter sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.sweep(Instant::now());
                        if removed > 0 {
                            debug!(
                                removed,
                                remaining = limiter.tracked_identities(),
                                "swept idle rate limit records"
                            );
                        }
                    }
                }
            }
        })
    }

    /// Shrink the map to the low-water mark below `max_identities`.
    ///
    /// Idle identities go first; if that is not enough, the identities whose
    /// latest request is oldest are evicted. `current` is never evicted. Only
    /// one caller runs a pass at a time; concurrent callers skip it.
    fn enforce_capacity(&self, current: &Identity, now: Instant) {
        if self
            .evicting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.capacity_passes.fetch_add(1, Ordering::Relaxed);

        let cap = self.settings.max_identities;
        let target = (cap - cap / 10).max(1);
        let swept = self.sweep(now);

        let len = self.records.len();
        if len > target {
            let mut by_recency: Vec<(Identity, Instant)> = self
                .records
                .iter()
                .filter(|entry| entry.key() != current)
                .filter_map(|entry| entry.value().back().map(|last| (entry.key().clone(), *last)))
                .collect();
            by_recency.sort_unstable_by_key(|(_, last)| *last);

            let excess = len - target;
            for (identity, _) in by_recency.into_iter().take(excess) {
                self.records.remove(&identity);
            }
            warn!(
                swept,
                evicted = excess,
                cap,
                "rate limiter over capacity, evicted least recent identities"
            );
        }

        self.evicting.store(false, Ordering::Release);
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = stamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Whole seconds until `expires`, rounded up and never below one
fn retry_after(expires: Instant, now: Instant) -> u64 {
    let wait = expires.saturating_duration_since(now);
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
