//! Mailsmith - fill named parameters into HTML email templates
//!
//! This library provides the parameter store, template resolver,
//! substitution engine and generator behind the `mailsmith` CLI.
//!
//! # Example
//!
//! ```rust
//! use mailsmith::{generate, GeneratorConfig, ParameterSet, TemplateLoadState};
//!
//! let config = GeneratorConfig::default();
//! let params = ParameterSet::from_pairs(&config, [("header", "Team"), ("filename", "welcome")]).unwrap();
//! let state = TemplateLoadState::Ready("<h1>{{ header }}</h1>".to_string());
//!
//! let doc = generate(&params, &state, &config).unwrap();
//! assert_eq!(doc.filename(), "welcome.html");
//! assert_eq!(doc.content(), "<h1>Team</h1>");
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod lint;
pub mod params;
pub mod storage;
pub mod substitute;
pub mod template;

pub use config::{ConfigError, GeneratorConfig};
pub use error::{ExportError, GenerateError};
pub use export::{DataUriExporter, Exporter, FileExporter};
pub use generate::{derive_filename, generate, GeneratedDocument, Generator};
pub use params::{ParameterError, ParameterKey, ParameterSet, ParameterStore};
pub use storage::{JsonFileStorage, MemoryStorage, StorageError};
pub use substitute::{placeholders, substitute};
pub use template::{
    TemplateError, TemplateLoadState, TemplateResolver, TemplateSelection, TemplateSource,
};

use thiserror::Error;

/// Any error surfaced by the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("cannot generate: {0}")]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
