// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Centralized environment variable access and runtime-directory
//! resolution for the CLI binary (SPEC_FULL §4.G/§6).

use std::path::PathBuf;

/// `JOBSUP_RUNTIME_DIR`, used both for production overrides and to give
/// tests an isolated runtime directory, mirroring the corpus's own
/// `OJ_STATE_DIR` convention.
pub fn runtime_dir_from_env() -> Option<PathBuf> {
    std::env::var("JOBSUP_RUNTIME_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// `XDG_STATE_HOME/jobsup` > `~/.local/state/jobsup` > `./jobsup-runtime`.
pub fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("jobsup");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/jobsup");
    }
    PathBuf::from("./jobsup-runtime")
}

/// Resolves the runtime directory: `--runtime-dir` flag > `JOBSUP_RUNTIME_DIR`
/// env > the config file's `runtime_dir` key > the default state directory.
///
/// Takes the env lookup's result as a plain argument rather than calling
/// [`runtime_dir_from_env`] itself, so the precedence chain is testable
/// without mutating live process environment.
pub fn resolve_runtime_dir(
    cli_flag: Option<PathBuf>,
    env_value: Option<PathBuf>,
    config_value: Option<PathBuf>,
) -> PathBuf {
    cli_flag
        .or(env_value)
        .or(config_value)
        .unwrap_or_else(default_state_dir)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
