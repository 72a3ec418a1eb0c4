// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! In-memory [`QueueBackend`] for tests, mirroring the two wire shapes
//! (list and sorted set) without a real server.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::backend::{QueueBackend, QueueError};

#[derive(Default)]
struct TopicState {
    list: Vec<String>,
    sorted: Vec<(String, u64)>,
}

/// Thread-safe in-memory backend. `Clone` shares the same underlying
/// store, so a test can hand one clone to a "producer" and another to a
/// "worker" and observe the same data, the way two processes share one
/// Redis server.
#[derive(Clone, Default)]
pub struct FakeQueueBackend {
    topics: std::sync::Arc<Mutex<HashMap<String, TopicState>>>,
}

impl FakeQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueBackend for FakeQueueBackend {
    fn push_left(&mut self, topic: &str, payload: &str) -> Result<(), QueueError> {
        let mut topics = self.topics.lock();
        topics
            .entry(topic.to_string())
            .or_default()
            .list
            .insert(0, payload.to_string());
        Ok(())
    }

    fn pop_right_blocking(
        &mut self,
        topic: &str,
        _timeout_secs: u64,
    ) -> Result<Option<String>, QueueError> {
        let mut topics = self.topics.lock();
        Ok(topics.entry(topic.to_string()).or_default().list.pop())
    }

    fn list_len(&mut self, topic: &str) -> Result<u64, QueueError> {
        let topics = self.topics.lock();
        Ok(topics.get(topic).map(|t| t.list.len()).unwrap_or(0) as u64)
    }

    fn sorted_add(&mut self, topic: &str, payload: &str, score: u64) -> Result<(), QueueError> {
        let mut topics = self.topics.lock();
        let state = topics.entry(topic.to_string()).or_default();
        state.sorted.retain(|(p, _)| p != payload);
        state.sorted.push((payload.to_string(), score));
        Ok(())
    }

    fn sorted_remove(&mut self, topic: &str, payload: &str) -> Result<bool, QueueError> {
        let mut topics = self.topics.lock();
        let state = topics.entry(topic.to_string()).or_default();
        let before = state.sorted.len();
        state.sorted.retain(|(p, _)| p != payload);
        Ok(state.sorted.len() != before)
    }

    fn sorted_first_eligible(
        &mut self,
        topic: &str,
        max_score: u64,
    ) -> Result<Option<String>, QueueError> {
        let topics = self.topics.lock();
        let state = match topics.get(topic) {
            Some(s) => s,
            None => return Ok(None),
        };
        let mut eligible: Vec<&(String, u64)> =
            state.sorted.iter().filter(|(_, s)| *s <= max_score).collect();
        eligible.sort_by_key(|(_, s)| *s);
        Ok(eligible.first().map(|(p, _)| p.clone()))
    }

    fn sorted_count_le(&mut self, topic: &str, max_score: u64) -> Result<u64, QueueError> {
        let topics = self.topics.lock();
        Ok(topics
            .get(topic)
            .map(|t| t.sorted.iter().filter(|(_, s)| *s <= max_score).count())
            .unwrap_or(0) as u64)
    }
}
