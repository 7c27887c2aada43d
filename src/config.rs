//! Backend selection.
//!
//! A [`SpaceConfig`] names a backend and how to reach it; [`SpaceConfig::open`]
//! turns it into a shared `dyn Space`. Settings come from the command line,
//! falling back to environment variables.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::space::{MemorySpace, RedisStore, RemoteSpace, Space};

/// Redis URL; selects the networked backend when set.
pub const ENV_REDIS_URL: &str = "ANOI_REDIS_URL";
/// Key prefix for the networked backend.
pub const ENV_PREFIX: &str = "ANOI_PREFIX";
/// Snapshot file for the in-process backend.
pub const ENV_SNAPSHOT: &str = "ANOI_SNAPSHOT";

pub const DEFAULT_PREFIX: &str = "anoi";

/// Upper bound on any single networked command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceConfig {
    /// In-process space, optionally persisted to a snapshot file
    Memory { snapshot: Option<PathBuf> },
    /// Space stored on a Redis server under `prefix`
    Redis { url: String, prefix: String },
}

impl Default for SpaceConfig {
    fn default() -> Self {
        SpaceConfig::Memory { snapshot: None }
    }
}

impl SpaceConfig {
    /// Read the configuration from `ANOI_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_REDIS_URL).filter(|u| !u.is_empty()) {
            let prefix = lookup(ENV_PREFIX)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
            return SpaceConfig::Redis { url, prefix };
        }
        SpaceConfig::Memory {
            snapshot: lookup(ENV_SNAPSHOT).filter(|p| !p.is_empty()).map(PathBuf::from),
        }
    }

    /// Connect to or load the configured backend.
    pub fn open(&self) -> Result<Arc<dyn Space>> {
        match self {
            SpaceConfig::Memory { snapshot: None } => {
                info!("using in-memory space");
                Ok(Arc::new(MemorySpace::new()))
            }
            SpaceConfig::Memory {
                snapshot: Some(path),
            } => {
                info!(path = %path.display(), "using snapshot-backed space");
                Ok(Arc::new(MemorySpace::load(path)?))
            }
            SpaceConfig::Redis { url, prefix } => {
                info!(%url, %prefix, "using redis space");
                let store = RedisStore::connect(url, DEFAULT_TIMEOUT)?;
                Ok(Arc::new(RemoteSpace::new(store, prefix.clone())))
            }
        }
    }
}

/// Default snapshot location: `$HOME/.config/anoi/space.bin`.
pub fn global_snapshot_path() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(|h| {
            let mut p = PathBuf::from(h);
            p.push(".config");
            p.push("anoi");
            p.push("space.bin");
            p
        })
    }
    #[cfg(windows)]
    {
        std::env::var("APPDATA").ok().map(|a| {
            let mut p = PathBuf::from(a);
            p.push("anoi");
            p.push("space.bin");
            p
        })
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
