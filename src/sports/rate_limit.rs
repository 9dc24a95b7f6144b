//! Client-side request quota

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Quota for the free sports data tier (the provider allows 30/min; keep a buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 25,
            window_ms: 60_000,
        }
    }
}

/// Sliding-window limiter over request instants. Never blocks: callers
/// that are refused fall back to static data.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_millis(config.window_ms),
            requests: VecDeque::with_capacity(config.max_requests),
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.requests.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a request now if the quota allows it.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.evict(now);
        if self.requests.len() >= self.max_requests {
            return false;
        }
        self.requests.push_back(now);
        true
    }

    pub fn remaining(&mut self) -> usize {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.max_requests.saturating_sub(self.requests.len())
    }

    pub fn reset(&mut self) {
        self.requests.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
