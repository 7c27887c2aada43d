//! The storage contract shared by every backend.
//!
//! A space stores, per UID, an ordered content vector and a sparse edge table
//! (key UID to value UID). Backends differ in where the bytes live, never in
//! what a sequence of calls observes:
//!
//! - [`MemorySpace`]: in-process maps, optionally snapshotted to disk
//! - [`RemoteSpace`]: a shared key-value server (see [`kv`])
//!
//! Reading an undefined edge yields NIL and reading unset content yields an
//! empty vector. Passing a UID that is not valid in the backend is an error.

use std::collections::BTreeSet;

use crate::error::{Result, SpaceError};
use crate::id::Uid;

pub mod kv;
pub mod memory;
pub mod remote;

pub use kv::{KeyValueStore, MemoryStore, RedisStore};
pub use memory::MemorySpace;
pub use remote::RemoteSpace;

/// Operations every backend implements.
///
/// The trait is object safe so callers can hold an `Arc<dyn Space>` and stay
/// unaware of which backend they talk to.
pub trait Space: Send + Sync {
    /// Hand out a fresh UID. No two calls, from any thread or process sharing
    /// the backend, ever return the same value.
    fn allocate(&self) -> Result<Uid>;

    /// Whether `uid` is intrinsic (character plane or reserved) or has been
    /// allocated by this backend.
    fn is_valid(&self, uid: Uid) -> Result<bool>;

    /// Fail with `InvalidIdentifier` unless `uid` is valid.
    fn check(&self, uid: Uid) -> Result<()> {
        if self.is_valid(uid)? {
            Ok(())
        } else {
            Err(SpaceError::InvalidIdentifier(uid))
        }
    }

    /// The content vector of `uid`; empty if never set.
    fn get_content(&self, uid: Uid) -> Result<Vec<Uid>>;

    /// Replace the content vector of `uid`. Every element must be valid.
    fn set_content(&self, uid: Uid, content: &[Uid]) -> Result<()>;

    /// The value of edge `key` on `uid`, or NIL if undefined.
    fn cross(&self, uid: Uid, key: Uid) -> Result<Uid>;

    /// Overwrite edge `key` on `uid`. Writing NIL removes the edge.
    fn set_cross(&self, uid: Uid, key: Uid, value: Uid) -> Result<()>;

    /// Set edge `key` on `uid` to `value` only if it is undefined, atomically
    /// with respect to every other write of the same (uid, key) pair. Returns
    /// the value the edge holds afterwards: `value` if this call won, the
    /// earlier value otherwise. A NIL `value` writes nothing.
    fn cross_or_insert(&self, uid: Uid, key: Uid, value: Uid) -> Result<Uid>;

    /// Every key with a defined edge on `uid`.
    fn get_keys(&self, uid: Uid) -> Result<BTreeSet<Uid>>;

    /// Persist buffered state, for backends that buffer. A no-op by default.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Two-mode edge access: with a value, overwrite the edge and return the
    /// value; without one, read it like [`Space::cross`].
    fn cross_equals(&self, uid: Uid, key: Uid, value: Option<Uid>) -> Result<Uid> {
        match value {
            Some(value) => {
                self.set_cross(uid, key, value)?;
                Ok(value)
            }
            None => self.cross(uid, key),
        }
    }

    /// Get-or-create: return the target of edge `key`, allocating a fresh UID
    /// and publishing it with [`Space::cross_or_insert`] when undefined. Racing
    /// callers all observe the single winning UID; the losers' allocations are
    /// left unreferenced.
    fn cross_or_allocate(&self, uid: Uid, key: Uid) -> Result<Uid> {
        let existing = self.cross(uid, key)?;
        if !existing.is_nil() {
            return Ok(existing);
        }
        let fresh = self.allocate()?;
        self.cross_or_insert(uid, key, fresh)
    }
}

/// Validity for a backend that has allocated `allocated` UIDs so far.
pub(crate) fn valid_with_count(uid: Uid, allocated: u64) -> bool {
    uid.is_intrinsic()
        || (uid.in_allocated_band() && uid.get() - crate::id::FIRST_ALLOCATED < allocated)
}

/// Check `uid` and every member of `refs` against one allocation count.
pub(crate) fn check_with_count(uid: Uid, refs: &[Uid], allocated: u64) -> Result<()> {
    std::iter::once(&uid)
        .chain(refs)
        .find(|&&r| !valid_with_count(r, allocated))
        .map_or(Ok(()), |&bad| Err(SpaceError::InvalidIdentifier(bad)))
}
