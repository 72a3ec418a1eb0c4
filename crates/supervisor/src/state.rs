// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Supervisor state (spec §3): the registered Job Descriptors plus the
//! runtime state the master mutates — the live worker set and the
//! back-off deadline — kept out of the descriptor itself so descriptors
//! stay immutable and `Clone`-safe across `fork()`.

use std::collections::HashMap;
use std::time::SystemTime;

use jobsup_core::{JobDescriptor, TopicId};

/// Whether a worker was forked at baseline (and is respawned on exit) or
/// by the autoscaler (and is not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Static,
    Dynamic,
}

/// Per-topic runtime state the master owns.
#[derive(Debug, Clone)]
pub struct TopicRuntime {
    pub descriptor: JobDescriptor,
    pub workers: HashMap<i32, WorkerKind>,
    /// Set only by a master reaping a failed child; honored only by the
    /// next worker forked for this topic, never read by the master.
    pub worker_enabled_time: Option<SystemTime>,
}

impl TopicRuntime {
    pub fn new(descriptor: JobDescriptor) -> Self {
        Self {
            descriptor,
            workers: HashMap::new(),
            worker_enabled_time: None,
        }
    }

    pub fn live_worker_count(&self) -> u32 {
        self.workers.len() as u32
    }

    pub fn live_static_count(&self) -> u32 {
        self.workers
            .values()
            .filter(|k| matches!(k, WorkerKind::Static))
            .count() as u32
    }

    pub fn insert_worker(&mut self, pid: i32, kind: WorkerKind) {
        self.workers.insert(pid, kind);
    }

    pub fn remove_worker(&mut self, pid: i32) -> Option<WorkerKind> {
        self.workers.remove(&pid)
    }

    pub fn all_pids(&self) -> Vec<i32> {
        self.workers.keys().copied().collect()
    }
}

/// Holds the set of registered topics (keyed by topic; insertion order
/// not semantic), the master PID, a pending-shutdown flag, and a
/// last-autoscale timestamp.
#[derive(Debug, Default)]
pub struct SupervisorState {
    pub topics: HashMap<TopicId, TopicRuntime>,
    pub master_pid: u32,
    pub shutting_down: bool,
    pub last_autoscale_check: Option<SystemTime>,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. A descriptor with an empty topic is
    /// silently ignored; re-registering the same topic overwrites its
    /// config but preserves any already-tracked runtime state... except
    /// that registration only ever happens before the master starts
    /// forking workers, so in practice this always starts fresh.
    pub fn register(&mut self, descriptor: JobDescriptor) {
        if descriptor.topic.is_empty() {
            return;
        }
        self.topics
            .insert(descriptor.topic.clone(), TopicRuntime::new(descriptor));
    }

    pub fn topic_mut(&mut self, topic: &TopicId) -> Option<&mut TopicRuntime> {
        self.topics.get_mut(topic)
    }

    /// Finds the topic owning a given worker PID, if still tracked.
    pub fn topic_for_pid(&self, pid: i32) -> Option<&TopicId> {
        self.topics
            .iter()
            .find(|(_, rt)| rt.workers.contains_key(&pid))
            .map(|(topic, _)| topic)
    }

    pub fn all_worker_pids(&self) -> Vec<i32> {
        self.topics.values().flat_map(|rt| rt.all_pids()).collect()
    }

    pub fn total_worker_count(&self) -> usize {
        self.topics.values().map(|rt| rt.workers.len()).sum()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
