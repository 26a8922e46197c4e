//! Filesystem artifact store: one file per key under a root directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::StorageKey;
use biosentinel_core::ports::ArtifactStore;

/// Artifact store rooted at a cache directory.
///
/// Writes go to a temporary file in the root and are renamed into place, so a
/// key either holds a complete artifact or nothing.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `key`. Keys are flat file names.
    pub fn path_for(&self, key: &StorageKey) -> Result<PathBuf> {
        let name = key.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(BioSentinelError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("storage key '{}' is not a plain file name", name),
            )));
        }
        Ok(self.root.join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, key: &StorageKey) -> Result<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn read(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| BioSentinelError::Io(e.error))?;
        Ok(())
    }

    fn locate(&self, key: &StorageKey) -> String {
        self.root.join(key.as_str()).display().to_string()
    }
}
