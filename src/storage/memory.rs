//! In-memory storage backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{ParameterStorage, StorageError, StoredEntry};

/// Storage held in memory
///
/// Clones share their entries, which lets a test hand one clone to a store,
/// drop the store, and build a new store over the other clone to simulate a
/// restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, StoredEntry>>>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every operation fails
    pub fn unavailable() -> Self {
        Self {
            entries: Arc::default(),
            unavailable: true,
        }
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable {
            Err(StorageError::unavailable("memory backend disabled"))
        } else {
            Ok(())
        }
    }
}

impl ParameterStorage for MemoryStorage {
    fn load_all(&self) -> Result<HashMap<String, StoredEntry>, StorageError> {
        self.check()?;
        Ok(self.lock().clone())
    }

    fn save(&mut self, key: &str, entry: StoredEntry) -> Result<(), StorageError> {
        self.check()?;
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.lock().remove(key);
        Ok(())
    }
}
