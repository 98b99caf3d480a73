//! Path-keyed file cache shared by the loader threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::AssetLoadError;

/// In-memory cache of file contents. No eviction: entries live as long as
/// the cache.
#[derive(Debug)]
pub struct AssetCache {
    enabled: bool,
    entries: DashMap<PathBuf, Arc<[u8]>>,
}

impl AssetCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read `path`, serving from memory when cached.
    pub fn read(&self, path: &Path) -> Result<Arc<[u8]>, AssetLoadError> {
        if self.enabled
            && let Some(bytes) = self.entries.get(path)
        {
            tracing::trace!(path = %path.display(), "Asset cache hit");
            return Ok(Arc::clone(bytes.value()));
        }

        let bytes: Arc<[u8]> = std::fs::read(path)
            .map_err(|source| AssetLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .into();

        if self.enabled {
            self.entries.insert(path.to_path_buf(), Arc::clone(&bytes));
        }
        Ok(bytes)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(true)
    }
}
