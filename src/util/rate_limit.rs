//! Rate limiting utilities

use dashmap::DashMap;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Raw WebSocket frames accepted per second, before any parsing
pub const FRAME_RATE_LIMIT: u32 = 30;

/// Per-connection flood guard in front of message parsing
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    frame_limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self {
            frame_limiter: create_limiter(FRAME_RATE_LIMIT),
        }
    }

    /// Check if a frame is allowed (returns true if allowed)
    pub fn check_frame(&self) -> bool {
        self.frame_limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-player sliding window of accepted event times (unix millis).
///
/// An event is admitted while fewer than `max_events` accepted events fall
/// inside the trailing `window_ms`. Rejected attempts are not recorded.
pub struct SlidingWindowLimiter {
    windows: DashMap<Uuid, VecDeque<u64>>,
    max_events: usize,
    window_ms: u64,
}

impl SlidingWindowLimiter {
    pub fn new(max_events: usize, window_ms: u64) -> Self {
        Self {
            windows: DashMap::new(),
            max_events,
            window_ms,
        }
    }

    /// Admit and record an event for `key` at `now_ms`
    pub fn check_at(&self, key: Uuid, now_ms: u64) -> bool {
        let mut window = self.windows.entry(key).or_default();

        while let Some(&oldest) = window.front() {
            if now_ms.saturating_sub(oldest) >= self.window_ms {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.max_events {
            return false;
        }

        window.push_back(now_ms);
        true
    }

    /// Drop windows whose newest entry is older than `idle_ms`.
    /// Returns the number of windows removed.
    pub fn prune_idle(&self, now_ms: u64, idle_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window
                .back()
                .is_some_and(|&newest| now_ms.saturating_sub(newest) < idle_ms)
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of players currently tracked
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
