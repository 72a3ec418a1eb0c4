// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The PID-file liveness registry (component C): a singleton guard and the
//! master's cooperative stop channel, in one file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PidRegistryError {
    #[error("failed to write pid file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create runtime directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owns `<runtime>/master.pid` and, transitively, the `<runtime>/` and
/// `<runtime>/logs/` directory tree.
#[derive(Debug, Clone)]
pub struct PidRegistry {
    path: PathBuf,
}

impl PidRegistry {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        let runtime_dir = runtime_dir.into();
        Self {
            path: runtime_dir.join("master.pid"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensures `<runtime>/` and `<runtime>/logs/` exist with permissive mode.
    pub fn ensure_dirs(&self) -> Result<(), PidRegistryError> {
        let runtime_dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        create_dir_permissive(&runtime_dir)?;
        create_dir_permissive(&runtime_dir.join("logs"))?;
        Ok(())
    }

    /// Reads the PID file, returning the live master PID or `0` if there
    /// is none. Any I/O or parse failure, or a PID that fails the
    /// signal-0 liveness probe, is reported as "no master".
    pub fn read_live_master(&self) -> u32 {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return 0,
        };
        let pid: i32 = match contents.trim().parse() {
            Ok(p) if p > 0 => p,
            _ => return 0,
        };
        if is_alive(pid) {
            pid as u32
        } else {
            0
        }
    }

    /// Atomically writes `pid` as decimal ASCII. Writing `0` is the
    /// cooperative stop directive.
    pub fn write_master(&self, pid: u32) -> Result<(), PidRegistryError> {
        self.ensure_dirs()?;
        let tmp_path = self.path.with_extension("pid.tmp");
        {
            let mut f = fs::File::create(&tmp_path).map_err(|source| PidRegistryError::Write {
                path: tmp_path.clone(),
                source,
            })?;
            f.write_all(pid.to_string().as_bytes())
                .map_err(|source| PidRegistryError::Write {
                    path: tmp_path.clone(),
                    source,
                })?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|source| PidRegistryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Signal-0 liveness probe: succeeds iff a process with this PID exists
/// and is reachable by us.
pub fn is_alive(pid: i32) -> bool {
    signal::kill(Pid::from_raw(pid), None).is_ok()
}

/// Sends `sig` to `pid`. Used to forward SIGUSR1 to tracked workers and to
/// self-signal a drain.
pub fn send_signal(pid: i32, sig: Signal) -> bool {
    signal::kill(Pid::from_raw(pid), sig).is_ok()
}

fn create_dir_permissive(dir: &Path) -> Result<(), PidRegistryError> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| PidRegistryError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    set_permissive_mode(dir);
    Ok(())
}

#[cfg(unix)]
fn set_permissive_mode(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(dir) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o777);
        let _ = fs::set_permissions(dir, perms);
    }
}

#[cfg(not(unix))]
fn set_permissive_mode(_dir: &Path) {}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
