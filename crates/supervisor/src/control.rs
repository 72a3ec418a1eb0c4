// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The CLI verb layer (component G, minus argument parsing, which lives
//! in the `cli` crate): the "Initial"/"Daemonize"/"Record" steps of spec
//! §4.F for `start`, plus `stop`/`restart`/`status` (§4.F.2).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use jobsup_adapters::{
    is_alive, LogWriter, PidRegistry, QueueAdapter, RealSleeper, RedisQueueBackend, Sleeper,
};
use jobsup_core::{Clock, JobDescriptor, SystemClock, TopicId};

use crate::alarm::{AlarmHook, LoggingAlarmHook};
use crate::daemonize::daemonize;
use crate::fork::{fork_child, try_reap_any};
use crate::handler::Handler;
use crate::state::WorkerKind;
use crate::supervisor::{Registration, Supervisor};
use crate::worker::WorkerLoop;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STOP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A live master already holds this runtime directory; `start` is a
    /// no-op.
    AlreadyRunning { pid: u32 },
    /// Singleton check passed and the process is about to daemonize.
    /// The caller of [`start`] never observes anything past this, since
    /// the daemonizing parent exits immediately.
    Daemonized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    pub stopped: bool,
    pub already_stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    AbortedStopFailed,
    Started(StartOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub running: bool,
    pub pid: Option<u32>,
}

/// `start` (spec §4.F Initial/Daemonize/Record/Spawn baseline/Run).
///
/// Idempotent w.r.t. an already-running master. Otherwise daemonizes —
/// the original process exits inside [`daemonize`] and never returns
/// from this call; only the daemonized child proceeds to record its PID,
/// fork the baseline, and enter the Run loop, exiting only once drained.
pub fn start(runtime_dir: &Path, registrations: Vec<Registration>) -> StartOutcome {
    let pid_registry = PidRegistry::new(runtime_dir);
    let live = pid_registry.read_live_master();
    if live != 0 {
        return StartOutcome::AlreadyRunning { pid: live };
    }

    if let Err(e) = daemonize() {
        eprintln!("jobsup: failed to daemonize: {e}");
        std::process::exit(1);
    }

    run_daemonized_master(runtime_dir, registrations);
}

/// The daemonized child's body: record PID, spawn baseline, run until
/// drained, exit. Never returns.
fn run_daemonized_master(runtime_dir: &Path, registrations: Vec<Registration>) -> ! {
    let pid_registry = PidRegistry::new(runtime_dir);
    let log = LogWriter::new(runtime_dir.join("logs/process.log"));

    let master_pid = std::process::id();
    if let Err(e) = pid_registry.write_master(master_pid) {
        log.error(&format!("failed to write pid file: {e}"));
        std::process::exit(1);
    }

    let factories: Arc<HashMap<TopicId, Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>>> =
        Arc::new(
            registrations
                .iter()
                .map(|r| (r.descriptor.topic.clone(), r.handler_factory.clone()))
                .collect(),
        );

    let alarm: Arc<dyn AlarmHook> = Arc::new(LoggingAlarmHook::new(log.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reap = Box::new(try_reap_any);
    let spawn = make_production_spawn(master_pid as i32, log.clone(), factories);
    let queue_size = make_production_queue_size();

    let mut supervisor = Supervisor::new(pid_registry, log.clone(), alarm, clock, reap, spawn, queue_size);
    supervisor.set_master_pid(master_pid);
    for registration in registrations {
        supervisor.register(registration);
    }

    if let Err(e) = supervisor.spawn_baseline() {
        log.error(&format!("failed to spawn baseline workers: {e}"));
        std::process::exit(1);
    }

    supervisor.run(&RealSleeper);
    std::process::exit(0);
}

#[allow(clippy::type_complexity)]
fn make_production_spawn(
    master_pid: i32,
    log: LogWriter,
    factories: Arc<HashMap<TopicId, Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>>>,
) -> Box<dyn FnMut(&TopicId, &JobDescriptor, WorkerKind, Option<SystemTime>) -> nix::Result<i32> + Send> {
    Box::new(move |topic, descriptor, _kind, back_off_until| {
        let topic = topic.clone();
        let descriptor = descriptor.clone();
        let log = log.clone();
        let factories = factories.clone();
        fork_child(move || {
            let handler = match factories.get(&topic) {
                Some(factory) => factory(),
                None => return 1,
            };
            let backend = match RedisQueueBackend::new(&descriptor.queue_config) {
                Ok(b) => b,
                Err(e) => {
                    log.error(&format!("worker for '{topic}' failed to connect: {e}"));
                    return 1;
                }
            };
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let queue = QueueAdapter::new(backend, clock.clone());
            let mut worker = WorkerLoop::new(
                topic.to_string(),
                descriptor.is_delay,
                descriptor.max_execute_time,
                descriptor.max_consume_count,
                master_pid,
                back_off_until,
                queue,
                handler,
                clock,
                log,
            );
            worker.run().exit_code()
        })
    })
}

fn make_production_queue_size() -> Box<dyn FnMut(&JobDescriptor) -> Option<u64> + Send> {
    Box::new(|descriptor: &JobDescriptor| {
        let backend = RedisQueueBackend::new(&descriptor.queue_config).ok()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let mut adapter = QueueAdapter::new(backend, clock);
        adapter.size(descriptor.topic.as_str(), descriptor.is_delay).ok()
    })
}

/// `stop` (spec §4.F.2) with production timing.
pub fn stop(runtime_dir: &Path) -> StopOutcome {
    stop_with(runtime_dir, STOP_POLL_INTERVAL, STOP_TIMEOUT, &RealSleeper, &SystemClock)
}

/// `stop`, parameterized over poll cadence/timeout/clock so it's
/// unit-testable without a real 30-second wait.
pub fn stop_with(
    runtime_dir: &Path,
    poll_interval: Duration,
    timeout: Duration,
    sleeper: &dyn Sleeper,
    clock: &dyn Clock,
) -> StopOutcome {
    let pid_registry = PidRegistry::new(runtime_dir);
    let live = pid_registry.read_live_master();
    if live == 0 {
        return StopOutcome {
            stopped: true,
            already_stopped: true,
        };
    }

    if pid_registry.write_master(0).is_err() {
        return StopOutcome {
            stopped: false,
            already_stopped: false,
        };
    }

    let deadline = clock.now() + timeout;
    loop {
        if !is_alive(live as i32) {
            return StopOutcome {
                stopped: true,
                already_stopped: false,
            };
        }
        if clock.now() >= deadline {
            return StopOutcome {
                stopped: false,
                already_stopped: false,
            };
        }
        sleeper.sleep(poll_interval);
    }
}

/// `restart`: `stop` then `start`, aborting if `stop` failed.
/// `start_fn` is injected so the (non-returning, forking) production
/// `start` can be swapped for a test double.
pub fn restart(
    runtime_dir: &Path,
    poll_interval: Duration,
    timeout: Duration,
    sleeper: &dyn Sleeper,
    clock: &dyn Clock,
    start_fn: impl FnOnce() -> StartOutcome,
) -> RestartOutcome {
    let outcome = stop_with(runtime_dir, poll_interval, timeout, sleeper, clock);
    if !outcome.stopped {
        return RestartOutcome::AbortedStopFailed;
    }
    RestartOutcome::Started(start_fn())
}

/// `status`: prints running/not-running and the PID if running.
pub fn status(runtime_dir: &Path) -> StatusReport {
    let pid_registry = PidRegistry::new(runtime_dir);
    let live = pid_registry.read_live_master();
    if live == 0 {
        StatusReport {
            running: false,
            pid: None,
        }
    } else {
        StatusReport {
            running: true,
            pid: Some(live),
        }
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
