// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the jobsup authors

//! Redis-backed [`QueueBackend`] with a reconnect-on-failure policy.
//!
//! Every operation goes through [`RedisQueueBackend::exec`]: if no
//! connection is open, one is opened; the command runs; on a connection
//! error the handle is dropped and a single reconnect-and-retry is
//! attempted; if that retry's command also fails the caller gets a hard
//! [`QueueError`].

use std::time::Duration;

use jobsup_core::QueueConfig;
use redis::{Commands, Connection, ErrorKind, RedisError};

use super::backend::{QueueBackend, QueueError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// A lazily-connected handle to one Redis-compatible server. Never shared
/// across a `fork()` — each process (master, each worker) opens its own on
/// first use, per the fork-safety rule in the concurrency model.
pub struct RedisQueueBackend {
    client: redis::Client,
    database: u8,
    password: Option<String>,
    conn: Option<Connection>,
}

impl RedisQueueBackend {
    pub fn new(config: &QueueConfig) -> Result<Self, QueueError> {
        let url = format!("redis://{}:{}/{}", config.host, config.port, config.database);
        let client = redis::Client::open(url).map_err(|e| QueueError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            database: config.database,
            password: config.password.clone(),
            conn: None,
        })
    }

    fn connect(&self) -> Result<Connection, QueueError> {
        let mut conn = self
            .client
            .get_connection_with_timeout(CONNECT_TIMEOUT)
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        if let Some(password) = &self.password {
            let _: String = redis::cmd("AUTH")
                .arg(password)
                .query(&mut conn)
                .map_err(|e| QueueError::Connect(e.to_string()))?;
        }
        let _: String = redis::cmd("SELECT")
            .arg(self.database)
            .query(&mut conn)
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        Ok(conn)
    }

    /// Runs `f` against the open connection, reconnecting lazily and
    /// retrying exactly once on a connection-level failure.
    fn exec<T>(&mut self, f: impl Fn(&mut Connection) -> redis::RedisResult<T>) -> Result<T, QueueError> {
        if self.conn.is_none() {
            self.conn = Some(self.connect()?);
        }
        let first = {
            let conn = self
                .conn
                .as_mut()
                .ok_or_else(|| QueueError::Connect("no connection".to_string()))?;
            f(conn)
        };
        match first {
            Ok(v) => Ok(v),
            Err(e) if is_connection_error(&e) => {
                tracing::warn!(error = %e, "queue backend connection dropped, reconnecting");
                self.conn = None;
                let mut fresh = self.connect()?;
                let v = f(&mut fresh).map_err(|e| {
                    tracing::error!(error = %e, "queue backend retry failed after reconnect");
                    QueueError::Command(e.to_string())
                })?;
                self.conn = Some(fresh);
                Ok(v)
            }
            Err(e) => Err(QueueError::Command(e.to_string())),
        }
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    matches!(e.kind(), ErrorKind::IoError) || e.is_connection_dropped() || e.is_timeout()
}

impl QueueBackend for RedisQueueBackend {
    fn push_left(&mut self, topic: &str, payload: &str) -> Result<(), QueueError> {
        self.exec(|conn| conn.lpush(topic, payload))
    }

    fn pop_right_blocking(
        &mut self,
        topic: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, QueueError> {
        let result: Option<(String, String)> =
            self.exec(|conn| conn.brpop(topic, timeout_secs as f64))?;
        Ok(result.map(|(_key, value)| value))
    }

    fn list_len(&mut self, topic: &str) -> Result<u64, QueueError> {
        self.exec(|conn| conn.llen(topic))
    }

    fn sorted_add(&mut self, topic: &str, payload: &str, score: u64) -> Result<(), QueueError> {
        self.exec(|conn| conn.zadd(topic, payload, score))
    }

    fn sorted_remove(&mut self, topic: &str, payload: &str) -> Result<bool, QueueError> {
        let removed: u64 = self.exec(|conn| conn.zrem(topic, payload))?;
        Ok(removed > 0)
    }

    fn sorted_first_eligible(
        &mut self,
        topic: &str,
        max_score: u64,
    ) -> Result<Option<String>, QueueError> {
        let members: Vec<String> = self.exec(|conn| {
            redis::cmd("ZRANGEBYSCORE")
                .arg(topic)
                .arg(0)
                .arg(max_score)
                .arg("LIMIT")
                .arg(0)
                .arg(1)
                .query(conn)
        })?;
        Ok(members.into_iter().next())
    }

    fn sorted_count_le(&mut self, topic: &str, max_score: u64) -> Result<u64, QueueError> {
        self.exec(|conn| conn.zcount(topic, 0, max_score))
    }
}
