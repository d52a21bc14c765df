//! Parameter model
//!
//! A [`ParameterSet`] always holds exactly the keys of a [`GeneratorConfig`],
//! each mapped to a string (empty by default). [`ParameterStore`] owns the
//! current set and mirrors every edit into durable storage.

mod store;

use std::fmt;

use thiserror::Error;

use crate::config::GeneratorConfig;

pub use store::ParameterStore;

/// Errors raised when addressing parameters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    /// The key is not part of the configured key set
    #[error("unknown parameter key '{key}' (valid keys: {valid})")]
    UnknownKey { key: String, valid: String },
}

/// Name of a configured parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey(String);

impl ParameterKey {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The literal placeholder token for this key, e.g. `{{ header }}`
    pub fn placeholder(&self) -> String {
        format!("{{{{ {} }}}}", self.0)
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current value of every configured key, in configuration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(ParameterKey, String)>,
}

impl ParameterSet {
    /// A set with every configured key mapped to the empty string
    pub fn defaults(config: &GeneratorConfig) -> Self {
        Self {
            entries: config
                .keys()
                .iter()
                .map(|k| (k.clone(), String::new()))
                .collect(),
        }
    }

    /// Build a set from `(key, value)` pairs; keys not in the pairs stay empty
    pub fn from_pairs<'a, I>(config: &GeneratorConfig, pairs: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::defaults(config);
        for (key, value) in pairs {
            set.set(key, value)?;
        }
        Ok(set)
    }

    /// Get the value for `key`, or `None` if the key is not configured
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of a configured key
    ///
    /// The value is stored verbatim. Unknown keys leave the set untouched.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ParameterError> {
        match self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some((_, slot)) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(ParameterError::UnknownKey {
                key: key.to_string(),
                valid: self.key_list(),
            }),
        }
    }

    /// Iterate over `(key, value)` pairs in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParameterKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset every value to the empty string
    pub fn reset(&mut self) {
        for (_, value) in &mut self.entries {
            value.clear();
        }
    }

    fn key_list(&self) -> String {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
