use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::metrics::RATE_LIMIT_KEYS;

// Rate limit entry - tracks requests per client key
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

// Stand-in window end for quotas too long for the clock to represent
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

// Sweeps never run more often than this, a zero period would busy-loop the timer
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

fn window_end(now: Instant, window: Duration) -> Instant {
    now.checked_add(window)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// How many requests a key may make inside one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Process-local fixed-window limiter.
///
/// Every check for a key runs while holding that key's map entry, so the
/// read-check-increment sequence is atomic with respect to other requests
/// for the same key. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a limiter together with its periodic sweep task.
    pub fn init(sweep_period: Duration) -> (Self, Sweeper) {
        let limiter = Self::new();
        let sweeper = Sweeper::spawn(limiter.clone(), sweep_period);
        (limiter, sweeper)
    }

    pub fn allow(&self, key: &str, quota: Quota) -> bool {
        self.allow_at(key, quota, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, key: &str, quota: Quota, now: Instant) -> bool {
        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitEntry {
                    count: 1,
                    reset_at: window_end(now, quota.window),
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();

                // window expired..? start a new one
                if now > entry.reset_at {
                    entry.count = 1;
                    entry.reset_at = window_end(now, quota.window);
                    return true;
                }

                // under limit..? allow
                if entry.count < quota.max_requests {
                    entry.count += 1;
                    return true;
                }

                // over limit, state untouched
                false
            }
        }
    }

    /// Drop every entry whose window has already expired. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = now <= entry.reset_at;
            if !keep {
                removed += 1;
            }
            keep
        });
        RATE_LIMIT_KEYS.set(self.entries.len() as f64);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }
}

/// Handle to the background sweep task started by [`RateLimiter::init`].
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    fn spawn(limiter: RateLimiter, period: Duration) -> Self {
        let period = period.max(MIN_SWEEP_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately, nothing to sweep yet
            ticker.tick().await;

            info!("Rate limit sweeper started (interval: {:?})", period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep(Instant::now());
                        if removed > 0 {
                            debug!(removed, remaining = limiter.len(), "Swept expired rate limit entries");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Rate limit sweeper stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the sweep task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}
