//! # Rate Limiter
//!
//! Process-wide fixed-window counters keyed by string.
//!
//! ```text
//! key "stylehunt:checkout_ip_203.0.113.9"
//!      │
//!      ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Mutex<HashMap<key, Window { count, started, length }>>                 │
//! │                                                                         │
//! │  hit(key, limit):                                                       │
//! │    no window / window expired ──► new window, count = 1 ──► allowed    │
//! │    otherwise                   ──► count += 1                          │
//! │                                     count <= max ──► allowed           │
//! │                                     count >  max ──► limited           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each `hit` is one check-and-increment under the lock, so concurrent
//! requests for the same key are counted exactly. Expired windows are
//! dropped by [`spawn_purge_task`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimit {
            max_requests,
            window,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
    length: Duration,
}

impl Window {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.length
    }
}

/// Keyed fixed-window counter store.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter::default()
    }

    /// Counts one request against `key`.
    ///
    /// Returns `true` if the request is within the limit. The counter is
    /// incremented either way.
    pub async fn hit(&self, key: &str, limit: RateLimit) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(window) if !window.is_expired(now) => {
                window.count = window.count.saturating_add(1);
                window.count <= limit.max_requests
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        started: now,
                        length: limit.window,
                    },
                );
                limit.max_requests >= 1
            }
        }
    }

    /// Drops expired windows. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now));
        before - windows.len()
    }

    /// Number of live keys (for tests and diagnostics).
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Spawns the periodic purge. The task ends when `shutdown` receives or
/// its sender is dropped.
pub fn spawn_purge_task(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown: mpsc::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.purge_expired().await;
                    if removed > 0 {
                        debug!(removed, "Purged expired rate-limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Rate-limit purge task stopping");
                    break;
                }
            }
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
