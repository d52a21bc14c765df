//! Template catalogs: where built-in template text comes from

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::is_valid_key_name;

/// Errors that can occur while obtaining template text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Template id not present in the catalog
    #[error("template not found: {id}")]
    NotFound { id: String },

    /// Template id that cannot name a template file
    #[error("invalid template id: {id}")]
    InvalidId { id: String },

    /// File not found for a file-based template or upload
    #[error("template file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Error reading a template file
    #[error("error reading template file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },
}

/// Catalog entry shown to users picking a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Source of built-in template text
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Fetch the raw text of template `id`
    async fn fetch(&self, id: &str) -> Result<String, TemplateError>;

    /// Templates this catalog can serve
    fn list(&self) -> Vec<TemplateInfo>;
}

struct Bundled {
    title: &'static str,
    description: &'static str,
    content: &'static str,
}

static BUNDLED: &[(&str, Bundled)] = &[
    (
        "template1",
        Bundled {
            title: "Template 1",
            description: "A clean, professional template suitable for general announcements and updates.",
            content: include_str!("../../templates/template1.html"),
        },
    ),
    (
        "template2",
        Bundled {
            title: "Template 2",
            description: "A modern, visually appealing template perfect for marketing campaigns.",
            content: include_str!("../../templates/template2.html"),
        },
    ),
];

/// Templates compiled into the binary
pub struct BuiltinCatalog {
    templates: HashMap<&'static str, &'static Bundled>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self {
            templates: BUNDLED.iter().map(|(id, b)| (*id, b)).collect(),
        }
    }

    /// Id of the template selected when nothing else has been chosen
    pub fn default_id() -> &'static str {
        BUNDLED[0].0
    }

    /// Get a bundled template's text without going through the async port
    pub fn get(&self, id: &str) -> Option<&'static str> {
        self.templates.get(id).map(|b| b.content)
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateCatalog for BuiltinCatalog {
    async fn fetch(&self, id: &str) -> Result<String, TemplateError> {
        self.get(id)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound { id: id.to_string() })
    }

    fn list(&self) -> Vec<TemplateInfo> {
        BUNDLED
            .iter()
            .map(|(id, b)| TemplateInfo {
                id: id.to_string(),
                title: b.title.to_string(),
                description: b.description.to_string(),
            })
            .collect()
    }
}

/// Templates stored as `<id>.html` files in a directory
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    /// Base path for resolving template files
    base_path: PathBuf,
    extension: String,
}

impl DirectoryCatalog {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            extension: "html".to_string(),
        }
    }

    /// Serve files with a different extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a template id to its file path
    pub fn resolve_path(&self, id: &str) -> Result<PathBuf, TemplateError> {
        if !is_valid_key_name(id) {
            return Err(TemplateError::InvalidId { id: id.to_string() });
        }
        Ok(self.base_path.join(format!("{}.{}", id, self.extension)))
    }
}

#[async_trait]
impl TemplateCatalog for DirectoryCatalog {
    async fn fetch(&self, id: &str) -> Result<String, TemplateError> {
        let path = self.resolve_path(id)?;
        match read_file_as_text(&path).await {
            Err(TemplateError::FileNotFound { .. }) => {
                Err(TemplateError::NotFound { id: id.to_string() })
            }
            other => other,
        }
    }

    fn list(&self) -> Vec<TemplateInfo> {
        let Ok(entries) = std::fs::read_dir(&self.base_path) else {
            return Vec::new();
        };
        let mut infos: Vec<TemplateInfo> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str()))
            .filter_map(|p| {
                let id = p.file_stem()?.to_str()?.to_string();
                is_valid_key_name(&id).then(|| TemplateInfo {
                    title: id.clone(),
                    description: p.display().to_string(),
                    id,
                })
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

/// Read an uploaded or on-disk template as UTF-8 text
pub async fn read_file_as_text(path: &Path) -> Result<String, TemplateError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            TemplateError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TemplateError::FileReadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    #[tokio::test]
    async fn test_builtin_fetch() {
        let catalog = BuiltinCatalog::new();
        let text = catalog.fetch("template1").await.expect("Should exist");
        assert!(text.contains("{{ header }}"));
        assert!(matches!(
            catalog.fetch("template9").await,
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_builtin_list() {
        let ids: Vec<String> = BuiltinCatalog::new().list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["template1", "template2"]);
        assert_eq!(BuiltinCatalog::default_id(), "template1");
    }

    #[test]
    fn test_bundled_templates_lint_clean() {
        let config = GeneratorConfig::default();
        let catalog = BuiltinCatalog::new();
        for info in catalog.list() {
            let text = catalog.get(&info.id).unwrap();
            assert!(
                crate::lint::check(text, &config).is_empty(),
                "{} has placeholder warnings",
                info.id
            );
        }
    }

    #[tokio::test]
    async fn test_directory_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("promo.html"), "<b>{{ cta }}</b>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = DirectoryCatalog::new(dir.path());
        assert_eq!(catalog.fetch("promo").await.unwrap(), "<b>{{ cta }}</b>");
        assert_eq!(
            catalog.fetch("absent").await,
            Err(TemplateError::NotFound { id: "absent".to_string() })
        );
        assert!(matches!(
            catalog.fetch("../promo").await,
            Err(TemplateError::InvalidId { .. })
        ));

        let ids: Vec<String> = catalog.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["promo"]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_file_as_text(&dir.path().join("none.html")).await;
        assert!(matches!(result, Err(TemplateError::FileNotFound { .. })));
    }
}
