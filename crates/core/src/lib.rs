// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobsup-core: topic identifiers, the Job Descriptor, and the clock
//! abstraction shared by the queue adapter, the daemon, and the CLI.

pub mod clock;
pub mod descriptor;
pub mod id;
pub mod time_fmt;
pub mod topic;

pub use clock::{Clock, FakeClock, SystemClock};
pub use descriptor::{JobDescriptor, QueueConfig};
pub use id::ShortId;
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use topic::TopicId;
