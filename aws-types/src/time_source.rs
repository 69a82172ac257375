/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Time sources for tests.

use aws_smithy_async::time::TimeSource;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Time source that only moves when told to.
///
/// Clones share the same clock, so a test can hand one clone to the code under test and keep
/// another to advance time.
#[derive(Clone, Debug)]
pub struct ManualTimeSource {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualTimeSource {
    /// Creates a time source starting at `start_time`.
    pub fn new(start_time: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_time)),
        }
    }

    /// Sets the current time.
    pub fn set_time(&self, time: SystemTime) {
        *self.now.lock().unwrap() = time;
    }

    /// Moves the current time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::ManualTimeSource;
    use aws_smithy_async::time::TimeSource;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn clones_share_a_clock() {
        let time = ManualTimeSource::new(UNIX_EPOCH);
        let other = time.clone();
        time.advance(Duration::from_secs(10));
        assert_eq!(UNIX_EPOCH + Duration::from_secs(10), other.now());
        other.set_time(UNIX_EPOCH);
        assert_eq!(UNIX_EPOCH, time.now());
    }
}
