//! In-memory run repository for testing.
//!
//! Stores runs as MessagePack bytes so the serialization path is exercised
//! without touching the file system.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Result, error::Error, pipeline::SavedRun, ports::RunRepository};

/// In-memory repository for testing.
///
/// # Examples
///
/// ```no_run
/// use crld::adapters::InMemoryRepository;
/// use crld::pipeline::SavedRun;
/// use crld::ports::RunRepository;
/// use std::path::Path;
///
/// fn keep(run: &SavedRun) -> crld::Result<SavedRun> {
///     let repo = InMemoryRepository::new();
///     repo.save(run, Path::new("run"))?;
///     repo.load(Path::new("run"))
/// }
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of runs currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Clear all stored runs.
    pub fn clear(&self) {
        self.storage().clear();
    }

    /// Check if a run exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(path.to_string_lossy().as_ref())
    }
}

impl RunRepository for InMemoryRepository {
    fn save(&self, run: &SavedRun, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec_named(run).map_err(|e| Error::SerializationContext {
            operation: "serialize run for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedRun> {
        let storage = self.storage();

        let bytes = storage
            .get(path.to_string_lossy().as_ref())
            .ok_or_else(|| Error::Io {
                operation: format!("load run from in-memory storage at {path:?}"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
            })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize run from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}
