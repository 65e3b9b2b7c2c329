//! Stores that receive finished model system documents.

use crate::core::error::{ModelSystemId, PersistenceError};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where saved documents go and where they are loaded from.
pub trait Persistence: Send + Sync {
    /// Store the document for a model system, replacing any previous one.
    fn persist(&self, id: ModelSystemId, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Read back the stored document for a model system.
    fn load(&self, id: ModelSystemId) -> Result<Vec<u8>, PersistenceError>;
}

/// Keeps documents in memory.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<ModelSystemId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ModelSystemId) -> bool {
        self.documents.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Persistence for MemoryStore {
    fn persist(&self, id: ModelSystemId, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.documents.write().insert(id, bytes.to_vec());
        Ok(())
    }

    fn load(&self, id: ModelSystemId) -> Result<Vec<u8>, PersistenceError> {
        self.documents
            .read()
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound(id))
    }
}

/// Keeps one `<id>.json` file per model system in a directory.
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the document for a model system.
    pub fn path_for(&self, id: ModelSystemId) -> PathBuf {
        self.directory.join(format!("{}.json", id))
    }
}

impl Persistence for FileStore {
    fn persist(&self, id: ModelSystemId, bytes: &[u8]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(id);
        fs::write(&path, bytes)?;
        debug!("Wrote {} byte(s) to {}", bytes.len(), path.display());
        Ok(())
    }

    fn load(&self, id: ModelSystemId) -> Result<Vec<u8>, PersistenceError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let id = ModelSystemId::new();
        assert!(matches!(store.load(id), Err(PersistenceError::NotFound(_))));

        store.persist(id, b"{}").unwrap();
        assert!(store.contains(id));
        assert_eq!(store.load(id).unwrap(), b"{}".to_vec());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("systems"));
        let id = ModelSystemId::new();
        assert!(matches!(store.load(id), Err(PersistenceError::NotFound(_))));

        store.persist(id, b"{\"Version\":\"1.0.0\"}").unwrap();
        assert!(store.path_for(id).exists());
        assert_eq!(store.load(id).unwrap(), b"{\"Version\":\"1.0.0\"}".to_vec());
    }
}
