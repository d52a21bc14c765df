//! Document generation
//!
//! [`Generator`] ties the parameter store and the template resolver together:
//! it checks that template text is available, substitutes the current
//! parameters into it and names the result. Handing the document to an
//! [`Exporter`](crate::export::Exporter) is left to the caller.

use tracing::{debug, info};

use crate::config::{GeneratorConfig, FILENAME_KEY};
use crate::error::GenerateError;
use crate::params::{ParameterSet, ParameterStore};
use crate::substitute::substitute;
use crate::template::{TemplateLoadState, TemplateResolver};

/// Substituted template text and the name to save it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    filename: String,
    content: String,
}

impl GeneratedDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn into_parts(self) -> (String, String) {
        (self.filename, self.content)
    }
}

/// Derive the output file name from the `filename` parameter
///
/// The value is trimmed; a blank value uses the configured default. The
/// configured extension is appended unless the name already ends with it
/// (compared case-insensitively).
pub fn derive_filename(requested: Option<&str>, config: &GeneratorConfig) -> String {
    let trimmed = requested.unwrap_or("").trim();
    let stem = if trimmed.is_empty() {
        config.default_filename.trim()
    } else {
        trimmed
    };

    let suffix = format!(".{}", config.extension);
    if stem.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()) {
        stem.to_string()
    } else {
        format!("{}{}", stem, suffix)
    }
}

/// Build a document from a parameter set and a template load state
pub fn generate(
    params: &ParameterSet,
    state: &TemplateLoadState,
    config: &GeneratorConfig,
) -> Result<GeneratedDocument, GenerateError> {
    let template = match state {
        TemplateLoadState::Idle => return Err(GenerateError::NoTemplateSelected),
        TemplateLoadState::Loading(_) => return Err(GenerateError::TemplateNotReady),
        TemplateLoadState::Failed(reason) => {
            return Err(GenerateError::TemplateLoadFailed(reason.clone()))
        }
        TemplateLoadState::Ready(text) => text,
    };

    let content = substitute(template, params);
    let filename = derive_filename(params.get(FILENAME_KEY), config);
    Ok(GeneratedDocument::new(filename, content))
}

/// Coordinates the parameter store and template resolver
#[derive(Debug)]
pub struct Generator {
    store: ParameterStore,
    resolver: TemplateResolver,
}

impl Generator {
    pub fn new(store: ParameterStore, resolver: TemplateResolver) -> Self {
        Self { store, resolver }
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.store.config()
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Generate from the current state without waiting
    pub fn generate(&self) -> Result<GeneratedDocument, GenerateError> {
        let state = self.resolver.state();
        self.generate_from(&state)
    }

    /// Wait for any in-flight template load, then generate
    ///
    /// The pending load must be running elsewhere, see
    /// [`TemplateResolver::settled`].
    pub async fn generate_when_ready(&self) -> Result<GeneratedDocument, GenerateError> {
        let state = self.resolver.settled().await;
        self.generate_from(&state)
    }

    /// Reset every parameter, erase persisted values and deselect the template
    pub fn clear(&mut self) {
        self.store.clear();
        self.resolver.reset();
        info!("generator cleared");
    }

    fn generate_from(&self, state: &TemplateLoadState) -> Result<GeneratedDocument, GenerateError> {
        let result = generate(self.store.get(), state, self.store.config());
        match &result {
            Ok(doc) => info!(filename = doc.filename(), bytes = doc.bytes().len(), "document generated"),
            Err(e) => debug!(error = %e, "generation refused"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::RequestToken;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        ParameterSet::from_pairs(&GeneratorConfig::default(), pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_filename_default_when_blank() {
        let config = GeneratorConfig::default();
        assert_eq!(derive_filename(Some(""), &config), "email.html");
        assert_eq!(derive_filename(Some("   "), &config), "email.html");
        assert_eq!(derive_filename(None, &config), "email.html");
    }

    #[test]
    fn test_filename_extension_appended() {
        let config = GeneratorConfig::default();
        assert_eq!(derive_filename(Some("report"), &config), "report.html");
        assert_eq!(derive_filename(Some("  report  "), &config), "report.html");
        assert_eq!(derive_filename(Some("report.html"), &config), "report.html");
        assert_eq!(derive_filename(Some("REPORT.HTML"), &config), "REPORT.HTML");
        assert_eq!(derive_filename(Some("report.htm"), &config), "report.htm.html");
    }

    #[test]
    fn test_filename_custom_extension() {
        let config = GeneratorConfig::default().with_extension("txt").with_default_filename("out");
        assert_eq!(derive_filename(Some(""), &config), "out.txt");
        assert_eq!(derive_filename(Some("notes"), &config), "notes.txt");
    }

    #[test]
    fn test_generate_rejects_idle() {
        let result = generate(&params(&[]), &TemplateLoadState::Idle, &GeneratorConfig::default());
        assert_eq!(result, Err(GenerateError::NoTemplateSelected));
    }

    #[test]
    fn test_generate_rejects_loading() {
        let state = TemplateLoadState::Loading(RequestToken::default());
        let result = generate(&params(&[]), &state, &GeneratorConfig::default());
        assert_eq!(result, Err(GenerateError::TemplateNotReady));
    }

    #[test]
    fn test_generate_rejects_failed() {
        let state = TemplateLoadState::Failed("template not found: x".to_string());
        let result = generate(&params(&[]), &state, &GeneratorConfig::default());
        assert_eq!(
            result,
            Err(GenerateError::TemplateLoadFailed("template not found: x".to_string()))
        );
    }

    #[test]
    fn test_generate_ready() {
        let state = TemplateLoadState::Ready("<h1>{{ header }}</h1>".to_string());
        let doc = generate(
            &params(&[("header", "Team"), ("filename", "welcome")]),
            &state,
            &GeneratorConfig::default(),
        )
        .unwrap();
        assert_eq!(doc.filename(), "welcome.html");
        assert_eq!(doc.content(), "<h1>Team</h1>");
    }
}
