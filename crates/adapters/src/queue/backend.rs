// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The raw storage primitives a queue backend must provide. A topic is a
//! single key holding either a list (FIFO) or a sorted set (delay); which
//! shape is in play is decided by the caller ([`QueueAdapter`](super::QueueAdapter)),
//! not the backend.

use thiserror::Error;

/// A backend-level failure. Connection failures are distinguished from
/// command failures so the adapter can apply its one-reconnect-and-retry
/// policy only to the former.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend connect failed: {0}")]
    Connect(String),
    #[error("queue backend command failed: {0}")]
    Command(String),
}

/// Raw list and sorted-set primitives over a topic key. Implementations
/// own their own reconnect policy (see [`RedisQueueBackend`](super::RedisQueueBackend)).
pub trait QueueBackend: Send {
    /// `LPUSH topic payload`.
    fn push_left(&mut self, topic: &str, payload: &str) -> Result<(), QueueError>;

    /// `BRPOP topic timeout_secs`, returning the popped value or `None` on
    /// timeout.
    fn pop_right_blocking(
        &mut self,
        topic: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, QueueError>;

    /// `LLEN topic`.
    fn list_len(&mut self, topic: &str) -> Result<u64, QueueError>;

    /// `ZADD topic score payload`.
    fn sorted_add(&mut self, topic: &str, payload: &str, score: u64) -> Result<(), QueueError>;

    /// `ZREM topic payload`, returning whether an element was actually removed.
    fn sorted_remove(&mut self, topic: &str, payload: &str) -> Result<bool, QueueError>;

    /// One member with score in `[0, max_score]`, if any (`ZRANGEBYSCORE
    /// topic 0 max_score LIMIT 0 1`).
    fn sorted_first_eligible(
        &mut self,
        topic: &str,
        max_score: u64,
    ) -> Result<Option<String>, QueueError>;

    /// Count of members with score in `[0, max_score]` (`ZCOUNT topic 0 max_score`).
    fn sorted_count_le(&mut self, topic: &str, max_score: u64) -> Result<u64, QueueError>;
}
