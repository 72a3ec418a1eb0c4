// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The master process (component F): baseline forking, non-blocking
//! reaping, crash back-off, and the backlog-driven autoscaler. The
//! daemonize/singleton/record steps of spec §4.F live in [`crate::control`]
//! — this module is only the "Run" state and what it delegates to.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use jobsup_adapters::{PidRegistry, Sleeper};
use jobsup_core::{Clock, JobDescriptor, TopicId};
use nix::sys::signal::Signal;
use thiserror::Error;

use crate::alarm::{AlarmEvent, AlarmHook};
use crate::handler::Handler;
use crate::signals::MasterSignals;
use crate::state::{SupervisorState, WorkerKind};

const CRASH_BACK_OFF: Duration = Duration::from_secs(60);
const AUTOSCALE_INTERVAL: Duration = Duration::from_secs(60);
pub const POLL_NORMAL: Duration = Duration::from_secs(1);
pub const POLL_DRAINING: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to fork worker for topic '{topic}': {source}")]
    Fork { topic: String, source: nix::Error },
}

/// Links a Job Descriptor to the handler its workers dispatch to. A fresh
/// handler is built per forked worker, never shared across `fork()`.
pub struct Registration {
    pub descriptor: JobDescriptor,
    pub handler_factory: Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>,
}

impl Registration {
    pub fn new(
        descriptor: JobDescriptor,
        handler_factory: Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>,
    ) -> Self {
        Self {
            descriptor,
            handler_factory,
        }
    }
}

/// One iteration's outcome: whether the run loop should keep polling or
/// every tracked child has been drained and it may exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Break,
}

/// The master's in-process view of the world, plus the OS/queue
/// operations it drives — all three injected so the reap/fork/backlog
/// loop is unit-testable without a real process tree or Redis server.
pub struct Supervisor {
    state: SupervisorState,
    handler_factories: std::collections::HashMap<TopicId, Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>>,
    pid_registry: PidRegistry,
    log: jobsup_adapters::LogWriter,
    alarm: Arc<dyn AlarmHook>,
    clock: Arc<dyn Clock>,
    reap: Box<dyn FnMut() -> nix::Result<Option<(i32, i32)>> + Send>,
    spawn: Box<dyn FnMut(&TopicId, &JobDescriptor, WorkerKind, Option<SystemTime>) -> nix::Result<i32> + Send>,
    queue_size: Box<dyn FnMut(&JobDescriptor) -> Option<u64> + Send>,
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pid_registry: PidRegistry,
        log: jobsup_adapters::LogWriter,
        alarm: Arc<dyn AlarmHook>,
        clock: Arc<dyn Clock>,
        reap: Box<dyn FnMut() -> nix::Result<Option<(i32, i32)>> + Send>,
        spawn: Box<dyn FnMut(&TopicId, &JobDescriptor, WorkerKind, Option<SystemTime>) -> nix::Result<i32> + Send>,
        queue_size: Box<dyn FnMut(&JobDescriptor) -> Option<u64> + Send>,
    ) -> Self {
        Self {
            state: SupervisorState::new(),
            handler_factories: std::collections::HashMap::new(),
            pid_registry,
            log,
            alarm,
            clock,
            reap,
            spawn,
            queue_size,
        }
    }

    pub fn register(&mut self, registration: Registration) {
        if registration.descriptor.topic.is_empty() {
            return;
        }
        let topic = registration.descriptor.topic.clone();
        self.state.register(registration.descriptor);
        self.handler_factories.insert(topic, registration.handler_factory);
    }

    pub fn set_master_pid(&mut self, pid: u32) {
        self.state.master_pid = pid;
    }

    pub fn handler_factory(&self, topic: &TopicId) -> Option<Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>> {
        self.handler_factories.get(topic).cloned()
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Forks `static_worker_count` workers per registered topic, all
    /// marked non-dynamic.
    pub fn spawn_baseline(&mut self) -> Result<(), SupervisorError> {
        let topics: Vec<(TopicId, JobDescriptor, u32, Option<SystemTime>)> = self
            .state
            .topics
            .values()
            .map(|rt| {
                (
                    rt.descriptor.topic.clone(),
                    rt.descriptor.clone(),
                    rt.descriptor.static_worker_count,
                    rt.worker_enabled_time,
                )
            })
            .collect();

        for (topic, descriptor, count, back_off_until) in topics {
            for _ in 0..count {
                let pid = (self.spawn)(&topic, &descriptor, WorkerKind::Static, back_off_until).map_err(
                    |source| {
                        tracing::error!(%topic, %source, "failed to fork baseline worker");
                        SupervisorError::Fork {
                            topic: topic.to_string(),
                            source,
                        }
                    },
                )?;
                tracing::info!(%topic, pid, "forked baseline worker");
                if let Some(rt) = self.state.topic_mut(&topic) {
                    rt.insert_worker(pid, WorkerKind::Static);
                }
            }
        }
        Ok(())
    }

    /// Drives the "Run" state (spec §4.F) to completion: installs the
    /// master's SIGUSR1 handler, then loops until every tracked child has
    /// been drained.
    pub fn run(&mut self, sleeper: &dyn Sleeper) {
        if let Err(e) = MasterSignals::install() {
            self.log.error(&format!("master failed to install signal handler: {e}"));
        }

        loop {
            if self.run_once() == LoopAction::Break {
                break;
            }
            let interval = if self.state.shutting_down {
                POLL_DRAINING
            } else {
                POLL_NORMAL
            };
            sleeper.sleep(interval);
        }
    }

    /// One pass of the run loop's body (everything but the poll sleep),
    /// exposed separately so tests can drive it deterministically.
    pub fn run_once(&mut self) -> LoopAction {
        if MasterSignals::exit_requested() && !self.state.shutting_down {
            self.begin_drain();
        }

        match (self.reap)() {
            Ok(Some((pid, code))) => self.handle_reaped(pid, code),
            Ok(None) => {}
            Err(_) => {
                // No children remain to wait for.
                if self.state.shutting_down {
                    return LoopAction::Break;
                }
            }
        }

        if !self.state.shutting_down {
            self.maybe_autoscale();
        }

        LoopAction::Continue
    }

    fn begin_drain(&mut self) {
        self.state.shutting_down = true;
        self.log.info("master draining: forwarding SIGUSR1 to all tracked workers");
        tracing::info!(pids = ?self.state.all_worker_pids(), "draining");
        for pid in self.state.all_worker_pids() {
            jobsup_adapters::send_signal(pid, Signal::SIGUSR1);
        }
    }

    fn handle_reaped(&mut self, pid: i32, code: i32) {
        let topic = match self.state.topic_for_pid(pid).cloned() {
            Some(t) => t,
            None => return,
        };

        if code != 0 {
            self.log
                .error(&format!("worker pid={pid} for topic '{topic}' exited with status {code}"));
            tracing::error!(%topic, pid, code, "worker exited non-zero");
            self.alarm.notify(&AlarmEvent::WorkerCrashed {
                topic: topic.to_string(),
                pid,
            });
            if let Some(rt) = self.state.topic_mut(&topic) {
                rt.worker_enabled_time = Some(self.clock.now() + CRASH_BACK_OFF);
            }
        } else {
            self.log.info(&format!("worker pid={pid} for topic '{topic}' exited cleanly"));
            tracing::info!(%topic, pid, "worker exited cleanly");
        }

        let kind = self
            .state
            .topic_mut(&topic)
            .and_then(|rt| rt.remove_worker(pid));

        if !self.state.shutting_down && kind == Some(WorkerKind::Static) {
            self.respawn_static(&topic);
        }
    }

    fn respawn_static(&mut self, topic: &TopicId) {
        let (descriptor, back_off_until) = match self.state.topics.get(topic) {
            Some(rt) => (rt.descriptor.clone(), rt.worker_enabled_time),
            None => return,
        };
        match (self.spawn)(topic, &descriptor, WorkerKind::Static, back_off_until) {
            Ok(pid) => {
                tracing::info!(%topic, pid, "respawned static worker");
                if let Some(rt) = self.state.topic_mut(topic) {
                    rt.insert_worker(pid, WorkerKind::Static);
                }
            }
            Err(e) => {
                self.log
                    .error(&format!("failed to respawn worker for topic '{topic}': {e}"));
                tracing::error!(%topic, error = %e, "failed to respawn static worker");
            }
        }
    }

    /// Step 4 of the Run state: every [`AUTOSCALE_INTERVAL`], verify the
    /// PID registry still names this master before running the
    /// autoscaler; a mismatch self-signals a drain instead.
    fn maybe_autoscale(&mut self) {
        let now = self.clock.now();
        let due = match self.state.last_autoscale_check {
            None => true,
            Some(last) => now
                .duration_since(last)
                .map(|d| d >= AUTOSCALE_INTERVAL)
                .unwrap_or(true),
        };
        if !due {
            return;
        }
        self.state.last_autoscale_check = Some(now);

        let live_master = self.pid_registry.read_live_master();
        if live_master != self.state.master_pid {
            self.log
                .error("master PID registry mismatch, self-signaling a drain");
            tracing::warn!(
                recorded = self.state.master_pid,
                observed = live_master,
                "pid registry mismatch, self-signaling a drain"
            );
            jobsup_adapters::send_signal(self.state.master_pid as i32, Signal::SIGUSR1);
            return;
        }

        self.autoscale();
    }

    fn autoscale(&mut self) {
        let topics: Vec<TopicId> = self.state.topics.keys().cloned().collect();
        for topic in topics {
            let (descriptor, live, back_off_until) = match self.state.topics.get(&topic) {
                Some(rt) => (rt.descriptor.clone(), rt.live_worker_count(), rt.worker_enabled_time),
                None => continue,
            };
            if !descriptor.autoscale_enabled() {
                continue;
            }
            let queue_size = match (self.queue_size)(&descriptor) {
                Some(n) => n,
                None => continue,
            };
            if !descriptor.autoscale_gate(live, queue_size) {
                continue;
            }

            let mut added = 0u32;
            for _ in 0..descriptor.dynamic_worker_count {
                match (self.spawn)(&topic, &descriptor, WorkerKind::Dynamic, back_off_until) {
                    Ok(pid) => {
                        if let Some(rt) = self.state.topic_mut(&topic) {
                            rt.insert_worker(pid, WorkerKind::Dynamic);
                        }
                        added += 1;
                    }
                    Err(e) => {
                        self.log
                            .error(&format!("failed to fork dynamic worker for '{topic}': {e}"));
                        tracing::error!(%topic, error = %e, "failed to fork dynamic worker");
                        break;
                    }
                }
            }
            if added > 0 {
                tracing::info!(%topic, added, queue_size, "autoscaler fired");
                self.alarm.notify(&AlarmEvent::AutoscaleTriggered {
                    topic: topic.to_string(),
                    added,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
