use crate::error::Result;
use crate::models::StorageKey;

/// Port for durable, key-addressable artifact storage
pub trait ArtifactStore {
    /// Whether an artifact exists at `key`
    fn exists(&self, key: &StorageKey) -> Result<bool>;

    /// Read the artifact at `key`, `None` if absent
    fn read(&self, key: &StorageKey) -> Result<Option<Vec<u8>>>;

    /// Write all of `bytes` at `key` or nothing at all
    fn write_atomic(&self, key: &StorageKey, bytes: &[u8]) -> Result<()>;

    /// Human-readable location of `key`
    fn locate(&self, key: &StorageKey) -> String;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for &T {
    fn exists(&self, key: &StorageKey) -> Result<bool> {
        (**self).exists(key)
    }

    fn read(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write_atomic(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
        (**self).write_atomic(key, bytes)
    }

    fn locate(&self, key: &StorageKey) -> String {
        (**self).locate(key)
    }
}
