//! Error types for generation and export

use thiserror::Error;

/// Reasons a document cannot be generated from the current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// Custom source selected (or nothing selected) and no text supplied
    #[error("no template selected: pick a built-in template or upload one")]
    NoTemplateSelected,

    /// A template fetch is still in flight
    #[error("template is still loading")]
    TemplateNotReady,

    /// The most recent template load failed
    #[error("template failed to load: {0}")]
    TemplateLoadFailed(String),
}

/// Errors from the export capability
#[derive(Error, Debug)]
pub enum ExportError {
    /// The destination cannot accept the document
    #[error("export unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ExportError {
    pub fn unavailable(reason: impl ToString) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}
