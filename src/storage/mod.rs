//! Persistence port for parameter values
//!
//! Each persisted parameter is an entry carrying its value and the instant it
//! stops being valid. Backends only move entries around; deciding whether an
//! entry is still live is the caller's job, using a [`Clock`].

mod file;
mod memory;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Errors reported by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read or written
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StorageError {
    pub fn unavailable(reason: impl ToString) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}

/// A persisted value with its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Whether the entry is still valid at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Key-value storage with per-key writes and bulk reads
pub trait ParameterStorage: Send {
    /// Read every stored entry, expired or not
    fn load_all(&self) -> Result<HashMap<String, StoredEntry>, StorageError>;

    /// Insert or replace one entry
    fn save(&mut self, key: &str, entry: StoredEntry) -> Result<(), StorageError>;

    /// Delete one entry; deleting a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Source of the current time for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same instant, so a test can keep a handle and advance
/// time under a store that owns another clone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
