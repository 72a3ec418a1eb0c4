// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Per-topic configuration: the Job Descriptor.
//!
//! A descriptor is immutable after construction. Runtime state (the live
//! worker set, the back-off deadline, the lazily-opened queue handle) is
//! owned by the supervisor, not the descriptor, so that descriptors stay
//! `Clone` and safe to hand to a freshly-forked child.

use crate::topic::TopicId;
use serde::{Deserialize, Serialize};

const MIN_WORKER_COUNT: u32 = 1;
const MAX_WORKER_COUNT: u32 = 1000;

/// Connection parameters for the backend a topic's queue lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub database: u8,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
        }
    }
}

/// Per-topic configuration, clamped at construction so every downstream
/// consumer can treat the fields as already valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub topic: TopicId,
    pub is_delay: bool,
    pub static_worker_count: u32,
    pub dynamic_worker_count: u32,
    pub health_queue_length: u32,
    pub max_execute_time: u64,
    pub max_consume_count: u64,
    pub queue_config: QueueConfig,
}

impl JobDescriptor {
    /// Builds a descriptor, clamping numeric fields to their documented
    /// ranges. Returns `None` for an empty topic — registration with an
    /// empty topic is silently ignored, per the registrar's contract.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topic: impl Into<TopicId>,
        is_delay: bool,
        static_worker_count: i64,
        dynamic_worker_count: i64,
        health_queue_length: i64,
        max_execute_time: i64,
        max_consume_count: i64,
        queue_config: QueueConfig,
    ) -> Option<Self> {
        let topic = topic.into();
        if topic.is_empty() {
            return None;
        }
        Some(Self {
            topic,
            is_delay,
            static_worker_count: clamp_worker_count(static_worker_count),
            dynamic_worker_count: clamp_worker_count(dynamic_worker_count),
            health_queue_length: clamp_nonneg_u32(health_queue_length),
            max_execute_time: clamp_nonneg_u64(max_execute_time),
            max_consume_count: clamp_nonneg_u64(max_consume_count),
            queue_config,
        })
    }

    /// `true` once a topic's backlog may trigger the autoscaler at all.
    pub fn autoscale_enabled(&self) -> bool {
        self.health_queue_length > 0 && self.dynamic_worker_count > 0
    }

    /// Whether `live_workers` permits the autoscaler to fire, ignoring the
    /// backlog-size check (callers combine this with a fresh `size(topic)`).
    pub fn autoscale_gate(&self, live_workers: u32, queue_size: u64) -> bool {
        self.autoscale_enabled()
            && live_workers <= self.static_worker_count
            && queue_size > self.health_queue_length as u64
    }

    pub fn max_worker_count(&self) -> u32 {
        self.static_worker_count + self.dynamic_worker_count
    }
}

fn clamp_worker_count(n: i64) -> u32 {
    n.clamp(MIN_WORKER_COUNT as i64, MAX_WORKER_COUNT as i64) as u32
}

fn clamp_nonneg_u32(n: i64) -> u32 {
    n.max(0) as u32
}

fn clamp_nonneg_u64(n: i64) -> u64 {
    n.max(0) as u64
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
