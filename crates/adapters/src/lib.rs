// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! External I/O for the supervisor: the queue adapter (component A), the
//! PID-file liveness registry (component C), and the append-only log
//! writer (component D).

mod logwriter;
mod pidfile;
pub mod queue;

pub use logwriter::{LogLevel, LogWriter};
pub use pidfile::{is_alive, send_signal, PidRegistry, PidRegistryError};
pub use queue::{QueueAdapter, QueueBackend, QueueError, RealSleeper, RedisQueueBackend, Sleeper};

#[cfg(any(test, feature = "test-support"))]
pub use queue::{FakeQueueBackend, FakeSleeper};
