// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! The registration file (SPEC_FULL §3/§4.G): a TOML document listing one
//! `[[topic]]` table per Job Descriptor, read once by `start`. This is how
//! a deployment registers topics without writing Rust.

use std::path::{Path, PathBuf};

use jobsup_core::{JobDescriptor, QueueConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("topic '{topic}' has an empty command")]
    EmptyCommand { topic: String },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    runtime_dir: Option<PathBuf>,
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default, rename = "topic")]
    topics: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    name: String,
    #[serde(default)]
    is_delay: bool,
    #[serde(default = "default_static_worker_count")]
    static_worker_count: i64,
    #[serde(default)]
    dynamic_worker_count: i64,
    #[serde(default)]
    health_queue_length: i64,
    #[serde(default)]
    max_execute_time: i64,
    #[serde(default)]
    max_consume_count: i64,
    /// Overrides the document-level `[queue]` table for this topic alone.
    queue: Option<QueueConfig>,
    /// Argv of the handler process; the payload is written to its stdin.
    command: Vec<String>,
}

fn default_static_worker_count() -> i64 {
    1
}

/// One registered topic: its clamped descriptor plus the handler command
/// the CLI's built-in [`crate::shell_handler::ShellCommandHandler`] runs.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub descriptor: JobDescriptor,
    pub command: Vec<String>,
}

/// The parsed, validated registration file.
#[derive(Debug, Default)]
pub struct Config {
    pub runtime_dir: Option<PathBuf>,
    pub topics: Vec<TopicConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut topics = Vec::with_capacity(raw.topics.len());
        for t in raw.topics {
            if t.command.is_empty() {
                return Err(ConfigError::EmptyCommand { topic: t.name });
            }
            let queue_config = t.queue.clone().unwrap_or_else(|| raw.queue.clone());
            let Some(descriptor) = JobDescriptor::new(
                t.name.clone(),
                t.is_delay,
                t.static_worker_count,
                t.dynamic_worker_count,
                t.health_queue_length,
                t.max_execute_time,
                t.max_consume_count,
                queue_config,
            ) else {
                continue; // empty topic name, silently ignored per §4.B
            };
            topics.push(TopicConfig {
                descriptor,
                command: t.command,
            });
        }

        Ok(Self {
            runtime_dir: raw.runtime_dir,
            topics,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
