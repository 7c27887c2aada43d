//! Networked space over a shared key-value server.
//!
//! UIDs travel as 32-bit big-endian words, so this backend addresses only
//! `[0, 2^32)`. Running the allocator past that ceiling is a fatal
//! `CapacityExceeded`, never retried.
//!
//! # Key layout
//!
//! With prefix `P` (stable per deployment; changing it orphans the data):
//!
//! | Key                | Kind   | Holds                                        |
//! |--------------------|--------|----------------------------------------------|
//! | `P:next`           | string | number of UIDs allocated so far (INCR)       |
//! | `P:c:<uid hex8>`   | string | content vector, concatenated 32-bit words    |
//! | `P:x:<uid hex8>`   | hash   | edge table, 4-byte key field -> 4-byte value |
//!
//! Each operation touches one key, so there is no atomicity across a UID's
//! content and its edges, or across UIDs. Callers building compound
//! structures order their writes (the trie publishes a node only after it
//! exists).

use std::collections::BTreeSet;

use tracing::debug;

use super::kv::KeyValueStore;
use super::{check_with_count, valid_with_count, Space};
use crate::error::{Result, SpaceError};
use crate::id::{Uid, FIRST_ALLOCATED, NIL};

/// Largest UID the 32-bit encoding can carry.
pub const MAX_REMOTE_UID: u64 = u32::MAX as u64;

pub struct RemoteSpace<K> {
    store: K,
    prefix: String,
}

impl<K: KeyValueStore> RemoteSpace<K> {
    pub fn new(store: K, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Number of UIDs allocated so far, as recorded by the server.
    pub fn allocated_count(&self) -> Result<u64> {
        match self.store.get(&self.counter_key())? {
            None => Ok(0),
            Some(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| SpaceError::corrupt(format!("counter {} is not an integer", self.counter_key()))),
        }
    }

    fn counter_key(&self) -> String {
        format!("{}:next", self.prefix)
    }

    fn content_key(&self, uid: Uid) -> String {
        format!("{}:c:{:08x}", self.prefix, uid.get())
    }

    fn edge_key(&self, uid: Uid) -> String {
        format!("{}:x:{:08x}", self.prefix, uid.get())
    }

    fn check_refs(&self, uid: Uid, refs: &[Uid]) -> Result<()> {
        check_with_count(uid, refs, self.allocated_count()?)
    }
}

fn pack(uid: Uid) -> Result<[u8; 4]> {
    u32::try_from(uid.get())
        .map(u32::to_be_bytes)
        .map_err(|_| SpaceError::InvalidIdentifier(uid))
}

fn unpack_one(bytes: &[u8]) -> Result<Uid> {
    let word: [u8; 4] = bytes
        .try_into()
        .map_err(|_| SpaceError::corrupt(format!("expected a 4-byte UID, got {} bytes", bytes.len())))?;
    Ok(Uid::new(u32::from_be_bytes(word) as u64))
}

fn unpack_all(bytes: &[u8]) -> Result<Vec<Uid>> {
    if bytes.len() % 4 != 0 {
        return Err(SpaceError::corrupt(format!(
            "content of {} bytes is not a whole number of UIDs",
            bytes.len()
        )));
    }
    bytes.chunks_exact(4).map(unpack_one).collect()
}

impl<K: KeyValueStore> Space for RemoteSpace<K> {
    fn allocate(&self) -> Result<Uid> {
        let n = self.store.incr(&self.counter_key())?;
        // INCR returns the new count, so the n-th allocation is index n - 1
        let raw = FIRST_ALLOCATED + n - 1;
        if raw > MAX_REMOTE_UID {
            return Err(SpaceError::capacity(format!(
                "allocation {} exceeds the 32-bit identifier ceiling",
                raw
            )));
        }
        let uid = Uid::new(raw);
        debug!(%uid, prefix = %self.prefix, "allocated");
        Ok(uid)
    }

    fn is_valid(&self, uid: Uid) -> Result<bool> {
        if uid.is_intrinsic() {
            return Ok(true);
        }
        if !uid.in_allocated_band() || uid.get() > MAX_REMOTE_UID {
            return Ok(false);
        }
        Ok(valid_with_count(uid, self.allocated_count()?))
    }

    fn get_content(&self, uid: Uid) -> Result<Vec<Uid>> {
        self.check(uid)?;
        match self.store.get(&self.content_key(uid))? {
            None => Ok(Vec::new()),
            Some(bytes) => unpack_all(&bytes),
        }
    }

    fn set_content(&self, uid: Uid, content: &[Uid]) -> Result<()> {
        self.check_refs(uid, content)?;
        let mut bytes = Vec::with_capacity(content.len() * 4);
        for &item in content {
            bytes.extend_from_slice(&pack(item)?);
        }
        self.store.set(&self.content_key(uid), &bytes)
    }

    fn cross(&self, uid: Uid, key: Uid) -> Result<Uid> {
        self.check_refs(uid, &[key])?;
        match self.store.hget(&self.edge_key(uid), &pack(key)?)? {
            None => Ok(NIL),
            Some(bytes) => unpack_one(&bytes),
        }
    }

    fn set_cross(&self, uid: Uid, key: Uid, value: Uid) -> Result<()> {
        self.check_refs(uid, &[key, value])?;
        let field = pack(key)?;
        if value.is_nil() {
            self.store.hdel(&self.edge_key(uid), &field)
        } else {
            self.store.hset(&self.edge_key(uid), &field, &pack(value)?)
        }
    }

    fn cross_or_insert(&self, uid: Uid, key: Uid, value: Uid) -> Result<Uid> {
        self.check_refs(uid, &[key, value])?;
        let edges = self.edge_key(uid);
        let field = pack(key)?;
        if !value.is_nil() && self.store.hsetnx(&edges, &field, &pack(value)?)? {
            return Ok(value);
        }
        match self.store.hget(&edges, &field)? {
            None => Ok(NIL),
            Some(bytes) => unpack_one(&bytes),
        }
    }

    fn get_keys(&self, uid: Uid) -> Result<BTreeSet<Uid>> {
        self.check(uid)?;
        self.store
            .hkeys(&self.edge_key(uid))?
            .iter()
            .map(|field| unpack_one(field))
            .collect()
    }
}
