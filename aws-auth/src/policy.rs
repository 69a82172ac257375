/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::refresh::RefreshResult;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_STALE_BUFFER: Duration = Duration::from_secs(60);
const DEFAULT_PREFETCH_BUFFER: Duration = Duration::from_secs(15 * 60);
const DEFAULT_MAX_PREFETCH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Derives when a cached value goes stale and when it should be prefetched from its expiry.
///
/// For a value expiring at `E` loaded at `now`:
/// - stale at `E - stale_buffer` (default 1 minute)
/// - prefetched at `min(now + max_prefetch_interval, E - prefetch_buffer)` (defaults 1 hour and
///   15 minutes)
///
/// Values that never expire never go stale and are prefetched every `max_prefetch_interval`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CachePolicy {
    stale_buffer: Duration,
    prefetch_buffer: Duration,
    max_prefetch_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_buffer: DEFAULT_STALE_BUFFER,
            prefetch_buffer: DEFAULT_PREFETCH_BUFFER,
            max_prefetch_interval: DEFAULT_MAX_PREFETCH_INTERVAL,
        }
    }
}

impl CachePolicy {
    /// Creates a policy with explicit windows.
    pub fn new(
        stale_buffer: Duration,
        prefetch_buffer: Duration,
        max_prefetch_interval: Duration,
    ) -> Self {
        Self {
            stale_buffer,
            prefetch_buffer,
            max_prefetch_interval,
        }
    }

    /// How long before expiry a value is considered stale.
    pub fn stale_buffer(&self) -> Duration {
        self.stale_buffer
    }

    /// How long before expiry a value should be prefetched.
    pub fn prefetch_buffer(&self) -> Duration {
        self.prefetch_buffer
    }

    /// Upper bound on the time between prefetches.
    pub fn max_prefetch_interval(&self) -> Duration {
        self.max_prefetch_interval
    }

    /// Returns the time at which a value expiring at `expiry` goes stale.
    pub fn stale_time(&self, expiry: Option<SystemTime>) -> Option<SystemTime> {
        expiry.map(|expiry| before(expiry, self.stale_buffer))
    }

    /// Returns the time at which a value loaded at `now` and expiring at `expiry` should be
    /// prefetched. Never later than its stale time.
    pub fn prefetch_time(&self, now: SystemTime, expiry: Option<SystemTime>) -> SystemTime {
        let latest = now + self.max_prefetch_interval;
        match expiry {
            Some(expiry) => latest
                .min(before(expiry, self.prefetch_buffer))
                .min(before(expiry, self.stale_buffer)),
            None => latest,
        }
    }

    /// Wraps `value` into a refresh result using this policy.
    pub fn refresh_result<T>(
        &self,
        value: T,
        now: SystemTime,
        expiry: Option<SystemTime>,
    ) -> RefreshResult<T> {
        RefreshResult::new(
            value,
            self.stale_time(expiry),
            Some(self.prefetch_time(now, expiry)),
        )
    }
}

fn before(time: SystemTime, buffer: Duration) -> SystemTime {
    time.checked_sub(buffer).unwrap_or(UNIX_EPOCH)
}
