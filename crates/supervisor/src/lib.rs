// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![allow(unsafe_code)] // fork(2) and signal handler registration require it.

//! The supervisor and worker lifecycle engine: the master/worker process
//! model, baseline and dynamic fork policy, per-worker recycling, crash
//! back-off, and the signal-driven lifecycle.

pub mod alarm;
pub mod control;
mod daemonize;
pub mod fork;
pub mod handler;
pub mod signals;
pub mod state;
pub mod supervisor;
pub mod worker;

pub use alarm::{AlarmEvent, AlarmHook, LoggingAlarmHook};
pub use control::{
    restart, start, status, stop, stop_with, RestartOutcome, StartOutcome, StatusReport,
    StopOutcome,
};
pub use daemonize::{daemonize, DaemonizeError};
pub use handler::{Handler, HandlerError};
pub use signals::{MasterSignals, WorkerSignals};
pub use state::{SupervisorState, TopicRuntime, WorkerKind};
pub use supervisor::{Registration, Supervisor, SupervisorError};
pub use worker::{WorkerLoop, WorkerOutcome};
