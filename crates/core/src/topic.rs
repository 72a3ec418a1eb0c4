// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Topic identifier — both the descriptor key and the backend queue key.

crate::define_id! {
    /// Unique identifier for a registered topic.
    pub struct TopicId;
}

impl TopicId {
    /// A topic registered with an empty name is silently ignored by the registrar.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
