// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The log writer (component D): an append-only line log with
//! size-triggered rotation, safe under concurrent writers across
//! processes.
//!
//! Two locks are in play: rotation takes a non-blocking exclusive lock (a
//! writer that loses the race just skips rotation and appends anyway),
//! appends take a blocking exclusive lock to serialize concurrent
//! writers. Every I/O error here is swallowed — logging must never crash
//! a caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

const ROTATE_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_SUFFIX: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Writes to one active log file, e.g. `<runtime>/logs/process.log`.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
    pid: u32,
}

impl LogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pid: std::process::id(),
        }
    }

    /// Appends one record. Never panics or propagates an error; failures
    /// are silently dropped.
    pub fn log(&self, level: LogLevel, text: &str) {
        let _ = self.try_log(level, text);
    }

    pub fn info(&self, text: &str) {
        self.log(LogLevel::Info, text);
    }

    pub fn error(&self, text: &str) {
        self.log(LogLevel::Error, text);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_log(&self, level: LogLevel, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.maybe_rotate();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let result = file.write_all(format_line(level, self.pid, text).as_bytes());
        let _ = file.unlock();
        result
    }

    /// Rotates `.4 -> .5, .3 -> .4, .2 -> .3, .1 -> .2, active -> .1` if
    /// the active file exceeds the threshold. Skips (rather than blocks)
    /// if another process currently holds the rotation lock.
    fn maybe_rotate(&self) {
        let len = match fs::metadata(&self.path) {
            Ok(m) => m.len(),
            Err(_) => return,
        };
        if len <= ROTATE_THRESHOLD_BYTES {
            return;
        }

        let file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(f) => f,
            Err(_) => return,
        };
        if file.try_lock_exclusive().is_err() {
            // Another process is rotating; proceed to append without rotating.
            return;
        }

        for n in (1..MAX_ROTATED_SUFFIX).rev() {
            let from = rotated_path(&self.path, n);
            let to = rotated_path(&self.path, n + 1);
            if from.exists() {
                let _ = fs::rename(&from, &to);
            }
        }
        let _ = fs::rename(&self.path, rotated_path(&self.path, 1));
        let _ = FileExt::unlock(&file);
    }
}

fn rotated_path(active: &Path, suffix: u32) -> PathBuf {
    let mut s = active.as_os_str().to_os_string();
    s.push(format!(".{suffix}"));
    PathBuf::from(s)
}

fn format_line(level: LogLevel, pid: u32, text: &str) -> String {
    let now = chrono::Local::now();
    let sanitized = text.replace(['\n', '\r'], " ");
    format!(
        "[{}][{}][pid={}]{}\n",
        now.format("%Y-%m-%d %H:%M:%S%.4f"),
        level,
        pid,
        sanitized
    )
}

#[cfg(test)]
#[path = "logwriter_tests.rs"]
mod tests;
