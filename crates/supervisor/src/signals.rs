// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Cooperative SIGUSR1 handling for both the master and each worker.
//!
//! POSIX signal handlers may only touch async-signal-safe state, so each
//! handler does nothing but flip a process-global `AtomicBool`; the
//! actual drain logic runs at the next loop boundary, never inside the
//! handler itself (spec §5, Cancellation).

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static WORKER_EXIT_REQUESTED: AtomicBool = AtomicBool::new(false);
static MASTER_EXIT_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_worker_sigusr1(_: i32) {
    WORKER_EXIT_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_master_sigusr1(_: i32) {
    MASTER_EXIT_REQUESTED.store(true, Ordering::SeqCst);
}

/// A worker's cooperative-exit flag, set by SIGUSR1.
pub struct WorkerSignals;

impl WorkerSignals {
    /// Installs the handler and clears any previously-set flag. Call
    /// once, right after fork, before entering the consumption loop.
    pub fn install() -> nix::Result<()> {
        WORKER_EXIT_REQUESTED.store(false, Ordering::SeqCst);
        // SAFETY: the handler only performs an atomic store.
        unsafe {
            signal::signal(Signal::SIGUSR1, SigHandler::Handler(handle_worker_sigusr1))?;
        }
        Ok(())
    }

    pub fn exit_requested() -> bool {
        WORKER_EXIT_REQUESTED.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn reset_for_test() {
        WORKER_EXIT_REQUESTED.store(false, Ordering::SeqCst);
    }
}

/// The master's drain flag, set by SIGUSR1 (self- or externally-delivered).
pub struct MasterSignals;

impl MasterSignals {
    pub fn install() -> nix::Result<()> {
        MASTER_EXIT_REQUESTED.store(false, Ordering::SeqCst);
        // SAFETY: the handler only performs an atomic store.
        unsafe {
            signal::signal(Signal::SIGUSR1, SigHandler::Handler(handle_master_sigusr1))?;
        }
        Ok(())
    }

    pub fn exit_requested() -> bool {
        MASTER_EXIT_REQUESTED.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn reset_for_test() {
        MASTER_EXIT_REQUESTED.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
