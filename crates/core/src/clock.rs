// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Time abstraction so back-off deadlines and TTL checks are unit-testable
//! without sleeping real wall-clock time.

use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time. Implementations must be cheap to call from a
/// tight poll loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Current time as Unix epoch seconds, the delay queue's score domain.
    fn now_unix_secs(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only advances when told to. Used to test recycling TTLs and
/// the crash back-off deadline without waiting in real time.
pub struct FakeClock {
    current: Mutex<SystemTime>,
}

impl FakeClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn at_unix_secs(secs: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(secs))
    }

    pub fn set(&self, t: SystemTime) {
        *self.current.lock() = t;
    }

    pub fn advance(&self, d: Duration) {
        *self.current.lock() += d;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
