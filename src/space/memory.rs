//! In-process space.
//!
//! Contents and edge tables live in concurrent maps keyed by UID; allocation
//! is an atomic counter. Edge writes go through the map entry for the owning
//! UID, which holds that shard's write lock, so `cross_or_insert` is atomic
//! per (uid, key).
//!
//! A space can be given a snapshot path. The snapshot is an rkyv archive that
//! is memory-mapped and validated on load, written atomically on save, and
//! saved automatically on drop when there are unsaved changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use memmap2::Mmap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{check_archived_root, Archive, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{check_with_count, valid_with_count, Space};
use crate::error::{Result, SpaceError};
use crate::id::{Uid, FIRST_ALLOCATED};

/// Bumped whenever the archived layout changes.
const SNAPSHOT_FORMAT: u32 = 1;

/// Serializable form of a space for persistence
#[derive(Archive, Deserialize, Serialize)]
#[archive(check_bytes)]
struct SpaceData {
    format: u32,
    allocated: u64,
    /// (uid, content), sorted by uid
    contents: Vec<(u64, Vec<u64>)>,
    /// (uid, [(key, value)]), sorted by uid then key
    edges: Vec<(u64, Vec<(u64, u64)>)>,
}

#[derive(Debug)]
pub struct MemorySpace {
    /// Number of UIDs allocated so far
    allocated: AtomicU64,
    contents: DashMap<Uid, Vec<Uid>>,
    edges: DashMap<Uid, BTreeMap<Uid, Uid>>,
    /// Snapshot path (None = in-memory only)
    path: Option<PathBuf>,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
}

impl MemorySpace {
    /// Create a new empty space (in-memory only)
    pub fn new() -> Self {
        Self::empty(None)
    }

    /// Create a new empty space that saves to `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::empty(Some(path.into()))
    }

    fn empty(path: Option<PathBuf>) -> Self {
        Self {
            allocated: AtomicU64::new(0),
            contents: DashMap::new(),
            edges: DashMap::new(),
            path,
            dirty: AtomicBool::new(false),
        }
    }

    /// Load a space from a snapshot, or create an empty one if the file
    /// doesn't exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self::with_path(path));
        }

        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::with_path(path));
        }

        // Memory-map the file for zero-copy validation
        let mmap = unsafe { Mmap::map(&file) }?;

        let archived = check_archived_root::<SpaceData>(&mmap)
            .map_err(|e| SpaceError::snapshot(format!("failed to validate snapshot: {}", e)))?;

        let data: SpaceData = archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|_| SpaceError::snapshot("failed to deserialize snapshot"))?;

        if data.format != SNAPSHOT_FORMAT {
            return Err(SpaceError::snapshot(format!(
                "unsupported snapshot format {} (expected {})",
                data.format, SNAPSHOT_FORMAT
            )));
        }

        let contents: DashMap<Uid, Vec<Uid>> = data
            .contents
            .into_iter()
            .map(|(uid, content)| {
                let content: Vec<Uid> = content.into_iter().map(Uid::new).collect();
                (Uid::new(uid), content)
            })
            .collect();
        let edges: DashMap<Uid, BTreeMap<Uid, Uid>> = data
            .edges
            .into_iter()
            .map(|(uid, table)| {
                let table: BTreeMap<Uid, Uid> = table
                    .into_iter()
                    .map(|(k, v)| (Uid::new(k), Uid::new(v)))
                    .collect();
                (Uid::new(uid), table)
            })
            .collect();

        info!(path = %path.display(), allocated = data.allocated, "loaded space snapshot");

        Ok(Self {
            allocated: AtomicU64::new(data.allocated),
            contents,
            edges,
            path: Some(path),
            dirty: AtomicBool::new(false),
        })
    }

    /// Save the space to its snapshot path.
    ///
    /// Writes racing with a save may or may not be captured; callers wanting
    /// an exact image should quiesce writers first.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SpaceError::snapshot("space has no snapshot path"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Clear first so a write landing mid-save marks the space dirty again
        self.dirty.store(false, Ordering::Release);

        let mut contents: Vec<(u64, Vec<u64>)> = self
            .contents
            .iter()
            .map(|entry| {
                let content = entry.value().iter().map(|u| u.get()).collect();
                (entry.key().get(), content)
            })
            .collect();
        contents.sort_unstable_by_key(|(uid, _)| *uid);

        let mut edges: Vec<(u64, Vec<(u64, u64)>)> = self
            .edges
            .iter()
            .map(|entry| {
                let table = entry
                    .value()
                    .iter()
                    .map(|(k, v)| (k.get(), v.get()))
                    .collect();
                (entry.key().get(), table)
            })
            .collect();
        edges.sort_unstable_by_key(|(uid, _)| *uid);

        let data = SpaceData {
            format: SNAPSHOT_FORMAT,
            allocated: self.allocated.load(Ordering::Acquire),
            contents,
            edges,
        };

        let mut serializer = AllocSerializer::<4096>::default();
        serializer
            .serialize_value(&data)
            .map_err(|e| SpaceError::snapshot(format!("failed to serialize space: {}", e)))?;
        let bytes = serializer.into_serializer().into_inner();

        // Write atomically by writing to temp file then renaming
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        info!(path = %path.display(), bytes = bytes.len(), "saved space snapshot");
        Ok(())
    }

    /// Number of UIDs allocated so far
    pub fn allocated_count(&self) -> u64 {
        self.allocated.load(Ordering::Acquire)
    }

    /// Check if there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Get the snapshot path (if any)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn check_refs(&self, uid: Uid, refs: &[Uid]) -> Result<()> {
        check_with_count(uid, refs, self.allocated_count())
    }
}

impl Space for MemorySpace {
    fn allocate(&self) -> Result<Uid> {
        let n = self.allocated.fetch_add(1, Ordering::AcqRel);
        if n > u64::MAX - FIRST_ALLOCATED {
            return Err(SpaceError::capacity("in-process identifier space exhausted"));
        }
        self.touch();
        let uid = Uid::allocated(n);
        debug!(%uid, "allocated");
        Ok(uid)
    }

    fn is_valid(&self, uid: Uid) -> Result<bool> {
        Ok(valid_with_count(uid, self.allocated_count()))
    }

    fn get_content(&self, uid: Uid) -> Result<Vec<Uid>> {
        self.check(uid)?;
        Ok(self
            .contents
            .get(&uid)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    fn set_content(&self, uid: Uid, content: &[Uid]) -> Result<()> {
        self.check_refs(uid, content)?;
        if content.is_empty() {
            self.contents.remove(&uid);
        } else {
            self.contents.insert(uid, content.to_vec());
        }
        self.touch();
        Ok(())
    }

    fn cross(&self, uid: Uid, key: Uid) -> Result<Uid> {
        self.check_refs(uid, &[key])?;
        Ok(self
            .edges
            .get(&uid)
            .and_then(|table| table.get(&key).copied())
            .unwrap_or(crate::id::NIL))
    }

    fn set_cross(&self, uid: Uid, key: Uid, value: Uid) -> Result<()> {
        self.check_refs(uid, &[key, value])?;
        if value.is_nil() {
            if let Some(mut table) = self.edges.get_mut(&uid) {
                table.remove(&key);
            }
        } else {
            self.edges.entry(uid).or_default().insert(key, value);
        }
        self.touch();
        Ok(())
    }

    fn cross_or_insert(&self, uid: Uid, key: Uid, value: Uid) -> Result<Uid> {
        self.check_refs(uid, &[key, value])?;
        if value.is_nil() {
            return self.cross(uid, key);
        }
        let mut table = self.edges.entry(uid).or_default();
        let current = *table.entry(key).or_insert(value);
        drop(table);
        if current == value {
            self.touch();
        }
        Ok(current)
    }

    fn get_keys(&self, uid: Uid) -> Result<BTreeSet<Uid>> {
        self.check(uid)?;
        Ok(self
            .edges
            .get(&uid)
            .map(|table| table.keys().copied().collect())
            .unwrap_or_default())
    }

    fn flush(&self) -> Result<()> {
        if self.path.is_some() && self.is_dirty() {
            self.save()?;
        }
        Ok(())
    }
}

impl Default for MemorySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemorySpace {
    fn drop(&mut self) {
        // Auto-save on drop if dirty and has a path
        if self.is_dirty() && self.path.is_some() {
            if let Err(e) = self.save() {
                warn!(error = %e, "failed to save space snapshot on drop");
            }
        }
    }
}
