// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The CLI binary's built-in [`Handler`]: runs a configured external
//! command per message, feeding the payload on its stdin. User handler
//! code proper is out of scope (spec §1); this is the one concrete
//! handler the standalone binary ships so a registration file alone is
//! enough to stand up a working deployment.

use std::io::Write;
use std::process::{Command, Stdio};

use jobsup_supervisor::{Handler, HandlerError};

pub struct ShellCommandHandler {
    program: String,
    args: Vec<String>,
}

impl ShellCommandHandler {
    /// `command` must be non-empty; [`crate::config::Config`] rejects
    /// topics with an empty command at load time.
    pub fn new(command: Vec<String>) -> Self {
        let mut iter = command.into_iter();
        let program = iter.next().unwrap_or_default();
        let args = iter.collect();
        Self { program, args }
    }
}

impl Handler for ShellCommandHandler {
    fn handle(&mut self, payload: &str) -> Result<(), HandlerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HandlerError::from(format!("failed to spawn '{}': {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(payload.as_bytes());
        }

        let status = child
            .wait()
            .map_err(|e| HandlerError::from(format!("failed to wait for '{}': {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(HandlerError::from(format!(
                "command '{}' exited with {status}",
                self.program
            )))
        }
    }
}

#[cfg(test)]
#[path = "shell_handler_tests.rs"]
mod tests;
