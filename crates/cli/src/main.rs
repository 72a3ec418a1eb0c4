// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! jobsup - the supervisor and worker lifecycle engine's CLI binary
//! (component G): translates `start`/`stop`/`restart`/`status` into
//! supervisor actions and wires a registration file's topics to a
//! built-in shell-command [`Handler`].

mod config;
mod env;
mod shell_handler;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use jobsup_core::JobDescriptor;
use jobsup_supervisor::{control, Registration};

use anyhow::Context;
use config::Config;
use shell_handler::ShellCommandHandler;

const USAGE: &str = "command usage: jobsup [start|stop|restart|status]";

#[derive(Parser)]
#[command(name = "jobsup", version, about = "A background job queue supervisor")]
struct Cli {
    /// Path to the TOML registration file.
    #[arg(long, global = true, value_name = "PATH", default_value = "jobsup.toml")]
    config: PathBuf,

    /// Overrides the runtime directory (master.pid, logs/).
    #[arg(long, global = true, value_name = "DIR")]
    runtime_dir: Option<PathBuf>,

    /// One of start, stop, restart, status.
    #[arg(value_name = "COMMAND")]
    command: Option<String>,
}

fn main() {
    std::process::exit(run());
}

/// Parses argv (clap handles `--help`/`--version` itself, exiting before
/// this ever returns) then dispatches. Spec §6: an unrecognized command
/// prints usage and exits 0, unconditionally; the TTY refusal in §6 only
/// gates the four real verbs, which are the only ones that "run" anything.
fn run() -> i32 {
    let cli = Cli::parse();

    let command = match cli.command.as_deref() {
        Some(c) if matches!(c, "start" | "stop" | "restart" | "status") => c,
        _ => {
            println!("{USAGE}");
            return 0;
        }
    };

    if !is_cli_environment() {
        eprintln!("jobsup: refuses to run outside an interactive CLI context");
        return 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match dispatch(command, &cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("jobsup: {e:#}");
            1
        }
    }
}

fn dispatch(command: &str, cli: &Cli) -> anyhow::Result<i32> {
    // `stop`/`status` need only the runtime directory, which may come
    // from a flag or env var with no config file on disk at all; only
    // `start` (and the `start` half of `restart`) requires topics to
    // actually be defined.
    let config = match Config::load(&cli.config) {
        Ok(c) => Some(c),
        Err(e) if matches!(command, "start" | "restart") => {
            return Err(e).context("loading registration file");
        }
        Err(e) => {
            tracing::warn!("proceeding without a registration file: {e}");
            None
        }
    };

    let runtime_dir = env::resolve_runtime_dir(
        cli.runtime_dir.clone(),
        env::runtime_dir_from_env(),
        config.as_ref().and_then(|c| c.runtime_dir.clone()),
    );

    Ok(match command {
        "start" => {
            let registrations = build_registrations(config.unwrap_or_default().topics);
            if registrations.is_empty() {
                eprintln!("jobsup: no topics registered in {}", cli.config.display());
                return Ok(1);
            }
            match control::start(&runtime_dir, registrations) {
                control::StartOutcome::AlreadyRunning { pid } => {
                    println!("jobsup is already running, pid={pid}");
                    0
                }
                // `start` only returns here for the already-running case;
                // the daemonized path never returns from `control::start`.
                control::StartOutcome::Daemonized => 0,
            }
        }
        "stop" => {
            let outcome = control::stop(&runtime_dir);
            if outcome.already_stopped {
                println!("jobsup is not running");
                0
            } else if outcome.stopped {
                println!("jobsup stopped");
                0
            } else {
                eprintln!("jobsup: master did not stop within the timeout");
                1
            }
        }
        "restart" => {
            let config = config.unwrap_or_default();
            let runtime_dir_for_start = runtime_dir.clone();
            let outcome = control::restart(
                &runtime_dir,
                std::time::Duration::from_millis(500),
                std::time::Duration::from_secs(30),
                &jobsup_adapters::RealSleeper,
                &jobsup_core::SystemClock,
                move || {
                    let registrations = build_registrations(config.topics);
                    control::start(&runtime_dir_for_start, registrations)
                },
            );
            match outcome {
                control::RestartOutcome::AbortedStopFailed => {
                    eprintln!("jobsup: stop failed, aborting restart");
                    1
                }
                control::RestartOutcome::Started(control::StartOutcome::AlreadyRunning { pid }) => {
                    println!("jobsup is already running, pid={pid}");
                    0
                }
                control::RestartOutcome::Started(control::StartOutcome::Daemonized) => 0,
            }
        }
        "status" => {
            let report = control::status(&runtime_dir);
            if report.running {
                println!("process is running, pid={}", report.pid.unwrap_or_default());
            } else {
                println!("process is not running");
            }
            0
        }
        _ => unreachable!("filtered to the four known verbs above"),
    })
}

fn build_registrations(topics: Vec<config::TopicConfig>) -> Vec<Registration> {
    topics
        .into_iter()
        .map(|t| registration_for(t.descriptor, t.command))
        .collect()
}

fn registration_for(descriptor: JobDescriptor, command: Vec<String>) -> Registration {
    let factory: Arc<dyn Fn() -> Box<dyn jobsup_supervisor::Handler> + Send + Sync> =
        Arc::new(move || Box::new(ShellCommandHandler::new(command.clone())));
    Registration::new(descriptor, factory)
}

/// Spec §6: refuse to run when standard input/output aren't attached to a
/// terminal-style context at launch.
fn is_cli_environment() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}
