//! Parameter store with write-through persistence

use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::storage::{Clock, ParameterStorage, StoredEntry, SystemClock};

use super::{ParameterError, ParameterSet};

/// Owns the current [`ParameterSet`] and mirrors edits into storage
///
/// Storage failures never reach the caller: reads degrade to defaults and
/// failed writes only cost persistence, the in-memory value is still updated.
pub struct ParameterStore {
    config: GeneratorConfig,
    params: ParameterSet,
    storage: Box<dyn ParameterStorage>,
    clock: Box<dyn Clock>,
}

impl ParameterStore {
    /// Create a store with default values, using the wall clock
    pub fn new(config: GeneratorConfig, storage: impl ParameterStorage + 'static) -> Self {
        Self::with_clock(config, storage, SystemClock)
    }

    /// Create a store with default values and an explicit clock
    pub fn with_clock(
        config: GeneratorConfig,
        storage: impl ParameterStorage + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let params = ParameterSet::defaults(&config);
        Self {
            config,
            params,
            storage: Box::new(storage),
            clock: Box::new(clock),
        }
    }

    /// Create a store and immediately restore persisted values
    pub fn open(
        config: GeneratorConfig,
        storage: impl ParameterStorage + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut store = Self::with_clock(config, storage, clock);
        store.load_persisted();
        store
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The current parameter set
    pub fn get(&self) -> &ParameterSet {
        &self.params
    }

    /// Update one key and persist it with a fresh retention window
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ParameterError> {
        let value = value.into();
        self.params.set(key, value.clone())?;

        let expires_at = self.clock.now() + self.config.retention;
        match self.storage.save(key, StoredEntry::new(value, expires_at)) {
            Ok(()) => debug!(key, %expires_at, "persisted parameter"),
            Err(e) => warn!(key, error = %e, "parameter not persisted"),
        }
        Ok(())
    }

    /// Replace the in-memory set with whatever storage still holds
    ///
    /// Keys with no entry, an expired entry, or an unreadable backend fall
    /// back to the empty string. Entries for unconfigured keys are ignored.
    pub fn load_persisted(&mut self) -> &ParameterSet {
        let mut params = ParameterSet::defaults(&self.config);
        let entries = match self.storage.load_all() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "parameter storage unreadable, using defaults");
                self.params = params;
                return &self.params;
            }
        };

        let now = self.clock.now();
        let mut restored = 0usize;
        for key in self.config.keys() {
            if let Some(entry) = entries.get(key.as_str()) {
                if entry.is_live(now) && params.set(key.as_str(), entry.value.clone()).is_ok() {
                    restored += 1;
                }
            }
        }
        info!(restored, total = params.len(), "restored persisted parameters");

        self.params = params;
        &self.params
    }

    /// Reset every key to empty and delete every persisted entry
    pub fn clear(&mut self) {
        self.params.reset();
        for key in self.config.keys() {
            if let Err(e) = self.storage.remove(key.as_str()) {
                warn!(key = key.as_str(), error = %e, "persisted parameter not removed");
            }
        }
        info!("cleared parameters");
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
