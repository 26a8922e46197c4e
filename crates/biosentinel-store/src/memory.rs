//! In-memory artifact store for dry runs and testing.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use biosentinel_core::error::Result;
use biosentinel_core::models::StorageKey;
use biosentinel_core::ports::ArtifactStore;

/// In-memory implementation of ArtifactStore
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    artifacts: Arc<RwLock<HashMap<StorageKey, Vec<u8>>>>,
}

impl MemoryArtifactStore {
    /// Create a new in-memory artifact store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.artifacts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn exists(&self, key: &StorageKey) -> Result<bool> {
        Ok(self.artifacts.read().unwrap_or_else(PoisonError::into_inner).contains_key(key))
    }

    fn read(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn write_atomic(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn locate(&self, key: &StorageKey) -> String {
        format!("memory://{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_artifacts() {
        let store = MemoryArtifactStore::new();
        let clone = store.clone();

        store.write_atomic(&StorageKey("a.tif".to_string()), &[1, 2, 3]).unwrap();

        assert!(clone.exists(&StorageKey("a.tif".to_string())).unwrap());
        assert_eq!(clone.len(), 1);
        assert_eq!(clone.locate(&StorageKey("a.tif".to_string())), "memory://a.tif");
    }
}
