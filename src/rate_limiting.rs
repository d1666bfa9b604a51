// ABOUTME: Injected minimum-interval rate limiter for outbound provider calls
// ABOUTME: Reserves per-key time slots so concurrent callers are spaced without holding locks while waiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Rate Limiting
//!
//! Each key ("llm", "nutritionix") gets a next-allowed instant. `acquire`
//! reserves the earliest slot for the caller and sleeps until it arrives, so
//! two concurrent callers are spaced by one interval rather than both firing
//! at once. The slot table lives in a `DashMap`; no lock is held across the
//! sleep.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Minimum spacing between calls sharing a key
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: DashMap<String, Instant>,
}

impl RateLimiter {
    /// Limiter spacing calls by `min_interval`
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: DashMap::new(),
        }
    }

    /// Limiter allowing `requests` calls per minute per key
    #[must_use]
    pub fn per_minute(requests: u32) -> Self {
        if requests == 0 {
            return Self::unlimited();
        }
        Self::new(Duration::from_secs(60) / requests)
    }

    /// Limiter that never waits
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured spacing
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserve the next slot for `key` and return when it starts
    fn reserve(&self, key: &str) -> Instant {
        let now = Instant::now();
        let mut entry = self.next_slot.entry(key.to_owned()).or_insert(now);
        let slot = (*entry).max(now);
        *entry = slot + self.min_interval;
        slot
    }

    /// Wait until a call for `key` is allowed
    pub async fn acquire(&self, key: &str) {
        if self.min_interval.is_zero() {
            return;
        }
        let slot = self.reserve(key);
        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(key, wait_ms = wait.as_millis(), "Rate limiter delaying call");
        }
        sleep_until(slot).await;
    }

    /// Time a caller would wait for `key` right now, without reserving
    #[must_use]
    pub fn time_until_ready(&self, key: &str) -> Duration {
        self.next_slot
            .get(key)
            .map_or(Duration::ZERO, |slot| {
                slot.saturating_duration_since(Instant::now())
            })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            larder_core::constants::network::LLM_MIN_INTERVAL_MS,
        ))
    }
}
