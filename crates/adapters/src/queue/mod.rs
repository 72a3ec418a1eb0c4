// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The queue adapter (component A): FIFO and delay semantics over an
//! opaque backend, with a reconnect-on-failure policy.

mod adapter;
mod backend;
mod redis_backend;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use adapter::QueueAdapter;
pub use backend::{QueueBackend, QueueError};
pub use redis_backend::RedisQueueBackend;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeQueueBackend;

use std::time::Duration;

/// Injectable sleep so the delay queue's empty-branch `usleep` is
/// unit-testable without burning real wall-clock time.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, d: Duration);
}

/// Sleeps for real. Used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Records requested sleeps instead of blocking. Used in tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct FakeSleeper {
    pub calls: parking_lot::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Sleeper for FakeSleeper {
    fn sleep(&self, d: Duration) {
        self.calls.lock().push(d);
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod adapter_tests;
