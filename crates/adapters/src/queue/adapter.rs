// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! FIFO and delay semantics layered over a raw [`QueueBackend`].

use std::sync::Arc;

use jobsup_core::Clock;

use super::backend::{QueueBackend, QueueError};
use super::{RealSleeper, Sleeper};

/// The four operations producers and workers need, dispatched to FIFO or
/// delay semantics by `is_delay`. See spec §4.A.
pub struct QueueAdapter<B: QueueBackend> {
    backend: B,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl<B: QueueBackend> QueueAdapter<B> {
    pub fn new(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            sleeper: Arc::new(RealSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Pushes `payload` onto `topic`. For delay topics, `eligible_at` is
    /// the Unix-epoch-second score; for FIFO topics it is ignored.
    pub fn deliver(
        &mut self,
        topic: &str,
        is_delay: bool,
        payload: &str,
        eligible_at: u64,
    ) -> Result<bool, QueueError> {
        if is_delay {
            self.backend.sorted_add(topic, payload, eligible_at)?;
        } else {
            self.backend.push_left(topic, payload)?;
        }
        Ok(true)
    }

    /// Removes `payload` by value from a delay topic. No-op for FIFO
    /// topics, which have no addressable identity.
    pub fn revoke(&mut self, topic: &str, is_delay: bool, payload: &str) -> Result<bool, QueueError> {
        if !is_delay {
            return Ok(false);
        }
        self.backend.sorted_remove(topic, payload)
    }

    /// Returns one payload, or `None` on timeout / empty backlog.
    ///
    /// FIFO: blocking right-pop. Delay: claim-by-delete against the
    /// lowest-scoring eligible member. A lost race (another worker claimed
    /// it first) returns `None` immediately so the loop retries against
    /// whatever is eligible next; only the empty branch (no candidate at
    /// all) sleeps `timeout` seconds, per the source's unconditional
    /// `usleep` there.
    pub fn pop(
        &mut self,
        topic: &str,
        is_delay: bool,
        timeout_secs: u64,
    ) -> Result<Option<String>, QueueError> {
        if !is_delay {
            return self.backend.pop_right_blocking(topic, timeout_secs);
        }

        let now = self.clock.now_unix_secs();
        match self.backend.sorted_first_eligible(topic, now)? {
            Some(payload) => {
                if self.backend.sorted_remove(topic, &payload)? {
                    Ok(Some(payload))
                } else {
                    Ok(None)
                }
            }
            None => {
                self.sleeper.sleep(std::time::Duration::from_secs(timeout_secs));
                Ok(None)
            }
        }
    }

    /// Current backlog size. For delay topics this counts only
    /// messages eligible *now*, not the total — future-dated messages
    /// aren't actionable work yet, so autoscaling shouldn't see them.
    pub fn size(&mut self, topic: &str, is_delay: bool) -> Result<u64, QueueError> {
        if is_delay {
            let now = self.clock.now_unix_secs();
            self.backend.sorted_count_le(topic, now)
        } else {
            self.backend.list_len(topic)
        }
    }
}
