//! JSON file storage backend
//!
//! The whole store is one JSON object keyed by parameter name:
//!
//! ```text
//! { "header": { "value": "Hello", "expires_at": "2024-05-01T12:00:00Z" } }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{ParameterStorage, StorageError, StoredEntry};

/// Storage persisted to a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::unavailable(format!(
                "reading {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn parse(&self, content: &str) -> Result<HashMap<String, StoredEntry>, StorageError> {
        serde_json::from_str(content).map_err(|e| {
            StorageError::unavailable(format!("parsing {}: {}", self.path.display(), e))
        })
    }

    fn read(&self) -> Result<HashMap<String, StoredEntry>, StorageError> {
        match self.read_raw()? {
            Some(content) => self.parse(&content),
            None => Ok(HashMap::new()),
        }
    }

    /// Read for a write: a corrupt file is replaced rather than blocking writes
    fn read_for_update(&self) -> Result<HashMap<String, StoredEntry>, StorageError> {
        let Some(content) = self.read_raw()? else {
            return Ok(HashMap::new());
        };
        match self.parse(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable parameter file");
                Ok(HashMap::new())
            }
        }
    }

    fn write(&self, entries: &HashMap<String, StoredEntry>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::unavailable(format!("creating {}: {}", parent.display(), e))
                })?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::unavailable(format!("serializing parameters: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| {
            StorageError::unavailable(format!("writing {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), entries = entries.len(), "wrote parameter file");
        Ok(())
    }
}

impl ParameterStorage for JsonFileStorage {
    fn load_all(&self) -> Result<HashMap<String, StoredEntry>, StorageError> {
        self.read()
    }

    fn save(&mut self, key: &str, entry: StoredEntry) -> Result<(), StorageError> {
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), entry);
        self.write(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}
