//! Generator configuration
//!
//! The set of parameter keys a template may reference is data, not code: it is
//! loaded from a TOML document so that new keys can be introduced without
//! touching the substitution engine. An embedded default document describes the
//! stock email generator.

use std::collections::HashSet;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

use crate::params::ParameterKey;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Name of the key whose value names the generated file
pub const FILENAME_KEY: &str = "filename";

/// Default configuration for the stock email templates
const DEFAULT_CONFIG: &str = r#"
[parameters]
keys = [
    "subject",
    "tracking_link",
    "unsubscribe_link",
    "filename",
    "header",
    "writeup",
    "cta",
    "cta_sentence",
    "cta_2",
]

[output]
default_filename = "email"
extension = "html"

[storage]
retention_days = 7
"#;

#[derive(Deserialize)]
struct TomlConfig {
    parameters: TomlParameters,
    output: Option<TomlOutput>,
    storage: Option<TomlStorage>,
}

#[derive(Deserialize)]
struct TomlParameters {
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct TomlOutput {
    default_filename: Option<String>,
    extension: Option<String>,
}

#[derive(Deserialize)]
struct TomlStorage {
    retention_days: Option<i64>,
}

/// Configuration shared by the store, the substitution engine and the generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Ordered list of configured parameter keys
    keys: Vec<ParameterKey>,
    /// File stem used when the `filename` parameter is blank
    pub default_filename: String,
    /// Extension appended to generated file names, without the dot
    pub extension: String,
    /// How long a persisted parameter survives after its last write
    pub retention: Duration,
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    ///
    /// Missing `[output]` and `[storage]` entries fall back to the defaults.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let output = parsed.output.unwrap_or(TomlOutput {
            default_filename: None,
            extension: None,
        });
        let retention_days = parsed
            .storage
            .and_then(|s| s.retention_days)
            .unwrap_or(7);

        let keys = validate_keys(parsed.parameters.keys)?;

        let config = GeneratorConfig {
            keys,
            default_filename: output.default_filename.unwrap_or_else(|| "email".to_string()),
            extension: output
                .extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or_else(|| "html".to_string()),
            retention: Duration::try_days(retention_days).ok_or_else(|| {
                ConfigError::Invalid(format!("retention_days out of range: {}", retention_days))
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// The configured keys in declaration order
    pub fn keys(&self) -> &[ParameterKey] {
        &self.keys
    }

    /// Look up a configured key by name
    pub fn key(&self, name: &str) -> Option<&ParameterKey> {
        self.keys.iter().find(|k| k.as_str() == name)
    }

    /// Check whether `name` is a configured key
    pub fn has_key(&self, name: &str) -> bool {
        self.key(name).is_some()
    }

    /// Set the default file stem
    pub fn with_default_filename(mut self, name: impl Into<String>) -> Self {
        self.default_filename = name.into();
        self
    }

    /// Set the output extension (a leading dot is stripped)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the retention window for persisted parameters
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.has_key(FILENAME_KEY) {
            return Err(ConfigError::Invalid(format!(
                "parameter keys must include '{}'",
                FILENAME_KEY
            )));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid("output extension is empty".to_string()));
        }
        if self.default_filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default filename is empty".to_string(),
            ));
        }
        if self.retention <= Duration::zero() {
            return Err(ConfigError::Invalid(
                "retention_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML")
    }
}

fn validate_keys(raw: Vec<String>) -> Result<Vec<ParameterKey>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::Invalid("no parameter keys configured".to_string()));
    }

    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(raw.len());
    for name in raw {
        if !is_valid_key_name(&name) {
            return Err(ConfigError::Invalid(format!(
                "invalid parameter key '{}': use letters, digits, '_' or '-'",
                name
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate parameter key '{}'",
                name
            )));
        }
        keys.push(ParameterKey::new(name));
    }
    Ok(keys)
}

/// Key names appear verbatim inside `{{ key }}`, so they may not contain
/// spaces or braces.
pub(crate) fn is_valid_key_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_key_char)
}

pub(crate) fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        let names: Vec<&str> = config.keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "subject",
                "tracking_link",
                "unsubscribe_link",
                "filename",
                "header",
                "writeup",
                "cta",
                "cta_sentence",
                "cta_2",
            ]
        );
        assert_eq!(config.default_filename, "email");
        assert_eq!(config.extension, "html");
        assert_eq!(config.retention, Duration::days(7));
    }

    #[test]
    fn test_minimal_config_uses_output_defaults() {
        let config = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename", "header"]
"#,
        )
        .expect("Should parse");
        assert_eq!(config.keys().len(), 2);
        assert!(config.has_key("header"));
        assert!(!config.has_key("cta"));
        assert_eq!(config.extension, "html");
    }

    #[test]
    fn test_custom_output_section() {
        let config = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename"]

[output]
default_filename = "newsletter"
extension = "htm"

[storage]
retention_days = 30
"#,
        )
        .expect("Should parse");
        assert_eq!(config.default_filename, "newsletter");
        assert_eq!(config.extension, "htm");
        assert_eq!(config.retention, Duration::days(30));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename", "cta", "cta"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_key_with_space_rejected() {
        let result = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename", "call to action"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_filename_key_required() {
        let result = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["header"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let result = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename"]

[storage]
retention_days = 0
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_huge_retention_rejected() {
        let result = GeneratorConfig::from_str(
            r#"
[parameters]
keys = ["filename"]

[storage]
retention_days = 9223372036854775807
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = GeneratorConfig::from_str("this is not valid toml {{{{");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_builder_pattern() {
        let config = GeneratorConfig::new()
            .with_default_filename("promo")
            .with_extension(".txt")
            .with_retention(Duration::days(1));
        assert_eq!(config.default_filename, "promo");
        assert_eq!(config.extension, "txt");
        assert_eq!(config.retention, Duration::days(1));
    }
}
