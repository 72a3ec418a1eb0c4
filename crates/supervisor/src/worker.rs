// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The per-child consumption loop (component E): runs inside a freshly
//! forked worker process from the moment it's handed a topic until it
//! exits, either cleanly (recycled, orphaned, or drained) or because the
//! handler raised.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use jobsup_adapters::{LogWriter, QueueAdapter, QueueBackend, RealSleeper, Sleeper};
use jobsup_core::Clock;

use crate::daemonize::set_process_title;
use crate::fork;
use crate::handler::Handler;
use crate::signals::WorkerSignals;

const BACK_OFF_POLL: Duration = Duration::from_millis(200);
const POP_TIMEOUT_SECS: u64 = 1;

/// How a worker's consumption loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Drained, orphaned, or recycled — exits 0.
    Clean,
    /// The handler raised — exits non-zero.
    HandlerFailed,
}

impl WorkerOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            WorkerOutcome::Clean => 0,
            WorkerOutcome::HandlerFailed => 1,
        }
    }
}

/// One worker's run of spec §4.E, parameterized over the queue backend and
/// handler so it's unit-testable without a real Redis server or fork.
pub struct WorkerLoop<B: QueueBackend, H: Handler> {
    topic: String,
    is_delay: bool,
    max_execute_time: u64,
    max_consume_count: u64,
    master_pid: i32,
    back_off_until: Option<SystemTime>,
    queue: QueueAdapter<B>,
    handler: H,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    log: LogWriter,
    parent_pid_probe: Box<dyn Fn() -> i32 + Send>,
}

#[allow(clippy::too_many_arguments)]
impl<B: QueueBackend, H: Handler> WorkerLoop<B, H> {
    pub fn new(
        topic: impl Into<String>,
        is_delay: bool,
        max_execute_time: u64,
        max_consume_count: u64,
        master_pid: i32,
        back_off_until: Option<SystemTime>,
        queue: QueueAdapter<B>,
        handler: H,
        clock: Arc<dyn Clock>,
        log: LogWriter,
    ) -> Self {
        Self {
            topic: topic.into(),
            is_delay,
            max_execute_time,
            max_consume_count,
            master_pid,
            back_off_until,
            queue,
            handler,
            clock,
            sleeper: Arc::new(RealSleeper),
            log,
            parent_pid_probe: Box::new(fork::parent_pid),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[cfg(test)]
    fn with_parent_pid_probe(mut self, probe: impl Fn() -> i32 + Send + 'static) -> Self {
        self.parent_pid_probe = Box::new(probe);
        self
    }

    /// Runs steps 1-6 of spec §4.E to completion. Only returns once the
    /// worker is ready to exit.
    pub fn run(&mut self) -> WorkerOutcome {
        set_process_title(&format!("jobsup: worker for {}", self.topic));
        if let Err(e) = WorkerSignals::install() {
            self.log.error(&format!(
                "worker for '{}' failed to install signal handler: {e}",
                self.topic
            ));
        }

        let start_time = self.clock.now();
        let mut consume_count: u64 = 0;

        self.wait_out_back_off();

        loop {
            if (self.parent_pid_probe)() != self.master_pid {
                self.log
                    .info(&format!("worker for '{}' orphaned, exiting", self.topic));
                break;
            }
            if WorkerSignals::exit_requested() {
                break;
            }
            if self.max_execute_time > 0 {
                let elapsed = self
                    .clock
                    .now()
                    .duration_since(start_time)
                    .unwrap_or_default();
                if elapsed.as_secs() > self.max_execute_time {
                    break;
                }
            }
            if self.max_consume_count > 0 && consume_count > self.max_consume_count {
                break;
            }

            match self.queue.pop(&self.topic, self.is_delay, POP_TIMEOUT_SECS) {
                Ok(Some(payload)) => match self.handler.handle(&payload) {
                    Ok(()) => consume_count += 1,
                    Err(e) => {
                        self.log.error(&format!(
                            "handler raised for topic '{}': {e}",
                            self.topic
                        ));
                        return WorkerOutcome::HandlerFailed;
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    self.log
                        .error(&format!("queue pop failed for topic '{}': {e}", self.topic));
                }
            }
        }

        WorkerOutcome::Clean
    }

    /// Step 4: if `back_off_until` is in the future, sleeps in bounded
    /// steps — re-checked at least every 200ms — rather than a single
    /// blocking sleep, so a drain signal can cut it short.
    fn wait_out_back_off(&self) {
        let Some(until) = self.back_off_until else {
            return;
        };
        while self.clock.now() < until {
            if WorkerSignals::exit_requested() {
                return;
            }
            self.sleeper.sleep(BACK_OFF_POLL);
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
