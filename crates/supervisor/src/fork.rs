// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Thin wrappers around `fork(2)` / `waitpid(2)` / the signal-0 liveness
//! probe. Kept in one place so every caller goes through the same
//! `unsafe` boundary.

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{ForkResult, Pid};

/// Forks. The child runs `child_body` to completion and then calls
/// `std::process::exit` with its return value — it never returns to the
/// caller. The parent gets the child's PID back.
///
/// # Safety
///
/// Must only be called from a single-threaded process, per `fork(2)`'s
/// contract (this crate's workers and master are single-threaded by
/// design; see the concurrency model).
pub fn fork_child(child_body: impl FnOnce() -> i32) -> nix::Result<i32> {
    // SAFETY: caller contract above; this crate never spawns OS threads.
    match unsafe { nix::unistd::fork() }? {
        ForkResult::Child => {
            let code = child_body();
            std::process::exit(code);
        }
        ForkResult::Parent { child } => Ok(child.as_raw()),
    }
}

/// One non-blocking reap (`waitpid(-1, WNOHANG)`). `Ok(None)` means no
/// child has exited since the last reap; `Err` means no children remain
/// to wait for.
pub fn try_reap_any() -> nix::Result<Option<(i32, i32)>> {
    match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG))? {
        WaitStatus::StillAlive => Ok(None),
        WaitStatus::Exited(pid, code) => Ok(Some((pid.as_raw(), code))),
        WaitStatus::Signaled(pid, _, _) => Ok(Some((pid.as_raw(), 1))),
        _ => Ok(None),
    }
}

/// The OS-provided parent-PID query, used by a worker to detect an
/// orphaning master crash.
pub fn parent_pid() -> i32 {
    nix::unistd::getppid().as_raw()
}

#[cfg(test)]
#[path = "fork_tests.rs"]
mod tests;
