//! MessagePack implementation of the run repository.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::{Result, error::Error, pipeline::SavedRun, ports::RunRepository};

/// MessagePack-based run repository.
///
/// Runs are written with named fields so files stay readable when fields
/// are added later.
///
/// # Examples
///
/// ```no_run
/// use crld::adapters::MsgPackRepository;
/// use crld::ports::RunRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository::new();
/// let run = repo.load(Path::new("run.msgpack"))?;
/// println!("{} steps", run.trajectory.steps());
/// # Ok::<(), crld::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl RunRepository for MsgPackRepository {
    fn save(&self, run: &SavedRun, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write_named(&mut writer, run).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize run to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        writer.into_inner().map_err(|e| Error::Io {
            operation: format!("flush file {path:?}"),
            source: e.into_error(),
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedRun> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize run from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::pipeline::record::fixtures::sample_run;

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("run.msgpack");

        let repo = MsgPackRepository::new();
        let run = sample_run();

        repo.save(&run, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(run, loaded);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_crld_12345.msgpack"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_load_garbage_returns_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("garbage.msgpack");
        std::fs::write(&file_path, b"not a run").unwrap();

        let result = MsgPackRepository::new().load(&file_path);
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(&sample_run(), Path::new("/invalid_dir_12345/run.msgpack"));
        assert!(result.is_err());
    }
}
