// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The user-provided handler contract a worker dispatches each payload to.

/// A handler raised rather than returning normally; the worker logs this
/// and exits non-zero.
#[derive(Debug, Clone)]
pub struct HandlerError(pub String);

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HandlerError {}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// User-provided work: `handle(payload) → void | raises`, per spec §4.B.
pub trait Handler: Send {
    fn handle(&mut self, payload: &str) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: FnMut(&str) -> Result<(), HandlerError> + Send,
{
    fn handle(&mut self, payload: &str) -> Result<(), HandlerError> {
        self(payload)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(&mut self, payload: &str) -> Result<(), HandlerError> {
        (**self).handle(payload)
    }
}
