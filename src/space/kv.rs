//! Key-value server abstraction behind [`RemoteSpace`](super::RemoteSpace).
//!
//! The command set is the subset of Redis the remote layout needs: an atomic
//! counter, plain string values, and hashes with a set-if-absent write.
//! [`RedisStore`] talks to a real server; [`MemoryStore`] keeps the same
//! semantics in process, for tests and for embedding without a server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Result, SpaceError};

pub trait KeyValueStore: Send + Sync {
    /// Atomically increment the integer at `key` (absent = 0) and return the
    /// new value.
    fn incr(&self, key: &str) -> Result<u64>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    fn hget(&self, key: &str, field: &[u8]) -> Result<Option<Vec<u8>>>;

    fn hset(&self, key: &str, field: &[u8], value: &[u8]) -> Result<()>;

    /// Set `field` only if absent; true if this call wrote it.
    fn hsetnx(&self, key: &str, field: &[u8], value: &[u8]) -> Result<bool>;

    fn hdel(&self, key: &str, field: &[u8]) -> Result<()>;

    fn hkeys(&self, key: &str) -> Result<Vec<Vec<u8>>>;
}

/// In-process store with Redis semantics. Clones share state, like several
/// connections to one server.
#[derive(Clone, Default)]
pub struct MemoryStore {
    strings: Arc<DashMap<String, Vec<u8>>>,
    hashes: Arc<DashMap<String, HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level keys (strings and hashes).
    pub fn num_records(&self) -> usize {
        self.strings.len() + self.hashes.len()
    }

    pub fn clear(&self) {
        self.strings.clear();
        self.hashes.clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn incr(&self, key: &str) -> Result<u64> {
        let mut entry = self
            .strings
            .entry(key.to_string())
            .or_insert_with(|| b"0".to_vec());
        let current: u64 = std::str::from_utf8(entry.value())
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SpaceError::Backend(format!("value at {} is not an integer", key)))?;
        let next = current + 1;
        *entry.value_mut() = next.to_string().into_bytes();
        Ok(next)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.strings.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.strings.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn hget(&self, key: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    fn hset(&self, key: &str, field: &[u8], value: &[u8]) -> Result<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_vec(), value.to_vec());
        Ok(())
    }

    fn hsetnx(&self, key: &str, field: &[u8], value: &[u8]) -> Result<bool> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_vec(), value.to_vec());
        Ok(true)
    }

    fn hdel(&self, key: &str, field: &[u8]) -> Result<()> {
        // Redis drops a hash once its last field is gone
        self.hashes.remove_if_mut(key, |_, hash| {
            hash.remove(field);
            hash.is_empty()
        });
        Ok(())
    }

    fn hkeys(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .hashes
            .get(key)
            .map(|hash| hash.keys().cloned().collect())
            .unwrap_or_default())
    }
}

/// A Redis connection. Commands from this process are serialized over one
/// connection; atomicity across processes comes from the server.
pub struct RedisStore {
    conn: Mutex<redis::Connection>,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1/`), bounding every command
    /// by `timeout`.
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_with_timeout(timeout)?;
        conn.set_read_timeout(Some(timeout))?;
        conn.set_write_timeout(Some(timeout))?;
        debug!(url, "connected to redis");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SpaceError::Backend("redis connection lock poisoned".to_string()))?;
        Ok(cmd.query(&mut *conn)?)
    }
}

impl KeyValueStore for RedisStore {
    fn incr(&self, key: &str) -> Result<u64> {
        let value: i64 = self.query(redis::cmd("INCR").arg(key))?;
        u64::try_from(value)
            .map_err(|_| SpaceError::corrupt(format!("counter {} is negative: {}", key, value)))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("GET").arg(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.query(redis::cmd("SET").arg(key).arg(value))
    }

    fn hget(&self, key: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("HGET").arg(key).arg(field))
    }

    fn hset(&self, key: &str, field: &[u8], value: &[u8]) -> Result<()> {
        self.query(redis::cmd("HSET").arg(key).arg(field).arg(value))
    }

    fn hsetnx(&self, key: &str, field: &[u8], value: &[u8]) -> Result<bool> {
        self.query(redis::cmd("HSETNX").arg(key).arg(field).arg(value))
    }

    fn hdel(&self, key: &str, field: &[u8]) -> Result<()> {
        self.query(redis::cmd("HDEL").arg(key).arg(field))
    }

    fn hkeys(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        self.query(redis::cmd("HKEYS").arg(key))
    }
}
