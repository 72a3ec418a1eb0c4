// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Daemonizer (half of component G): detach the current process from its
//! controlling terminal and become a session leader.

use nix::unistd::ForkResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonizeError {
    #[error("fork failed: {0}")]
    Fork(nix::Error),
    #[error("setsid failed: {0}")]
    Setsid(nix::Error),
    #[error("chdir(\"/\") failed: {0}")]
    Chdir(std::io::Error),
}

/// Forks; the parent exits immediately (so the shell that launched
/// `start` returns right away). The child becomes a session leader,
/// `chdir`s to `/`, clears its umask, and closes stdin. stdout/stderr
/// are retained for debugging, per spec §4.F.
///
/// Only the child returns from this function.
pub fn daemonize() -> Result<(), DaemonizeError> {
    // SAFETY: called once at process startup before any other threads exist.
    match unsafe { nix::unistd::fork() }.map_err(DaemonizeError::Fork)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    nix::unistd::setsid().map_err(DaemonizeError::Setsid)?;
    std::env::set_current_dir("/").map_err(DaemonizeError::Chdir)?;
    nix::sys::stat::umask(nix::sys::stat::Mode::empty());

    // SAFETY: fd 0 is always a valid fd to close at process startup.
    unsafe {
        libc::close(0);
    }

    set_process_title("jobsup: master");
    Ok(())
}

/// Best-effort process title so `ps` shows something more useful than
/// the binary name. A no-op where the platform doesn't support it.
#[cfg(target_os = "linux")]
pub fn set_process_title(title: &str) {
    let mut buf = [0u8; 16];
    let bytes = title.as_bytes();
    let n = bytes.len().min(buf.len() - 1);
    buf[..n].copy_from_slice(&bytes[..n]);
    // SAFETY: PR_SET_NAME reads up to 16 bytes (including the NUL) from a
    // valid pointer; `buf` is 16 bytes and NUL-terminated by construction.
    unsafe {
        libc::prctl(libc::PR_SET_NAME, buf.as_ptr() as libc::c_ulong, 0, 0, 0);
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_process_title(_title: &str) {}
