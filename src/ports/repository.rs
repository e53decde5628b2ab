//! Repository port for run persistence.
//!
//! This module defines the trait boundary between the domain and infrastructure
//! layers for storing and retrieving completed learning runs.

use std::path::Path;

use crate::{Result, pipeline::SavedRun};

/// Port for persisting and loading learning runs.
///
/// # Examples
///
/// ```no_run
/// use crld::{pipeline::SavedRun, ports::RunRepository};
/// use std::path::Path;
///
/// fn archive<R: RunRepository>(repo: &R, run: &SavedRun) -> crld::Result<()> {
///     repo.save(run, Path::new("run.msgpack"))
/// }
/// ```
pub trait RunRepository {
    /// Save a run to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or serialization fails.
    fn save(&self, run: &SavedRun, path: &Path) -> Result<()>;

    /// Load a run from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be read or holds invalid data.
    fn load(&self, path: &Path) -> Result<SavedRun>;
}
