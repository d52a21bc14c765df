//! Export capability
//!
//! The generator produces a [`GeneratedDocument`]; an [`Exporter`] delivers it
//! to the user. Exporters never retry: a failure is reported once as
//! [`ExportError::Unavailable`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use crate::error::ExportError;
use crate::generate::GeneratedDocument;

/// Delivers a generated document to the user's environment
pub trait Exporter {
    fn export(&mut self, doc: &GeneratedDocument) -> Result<(), ExportError>;
}

/// Writes documents into a directory under their generated file name
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `doc` will be written
    ///
    /// Only the final path component of the file name is used, so a
    /// `filename` parameter cannot point outside the directory.
    pub fn path_for(&self, doc: &GeneratedDocument) -> Result<PathBuf, ExportError> {
        let name = Path::new(doc.filename())
            .file_name()
            .ok_or_else(|| ExportError::unavailable(format!("unusable file name '{}'", doc.filename())))?;
        Ok(self.dir.join(name))
    }
}

impl Exporter for FileExporter {
    fn export(&mut self, doc: &GeneratedDocument) -> Result<(), ExportError> {
        if !self.dir.is_dir() {
            return Err(ExportError::unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let path = self.path_for(doc)?;
        fs::write(&path, doc.bytes())
            .map_err(|e| ExportError::unavailable(format!("writing {}: {}", path.display(), e)))?;
        info!(path = %path.display(), bytes = doc.bytes().len(), "document exported");
        Ok(())
    }
}

/// Writes each document as a `data:` URI line, the form browsers download
/// directly
#[derive(Debug)]
pub struct DataUriExporter<W: Write> {
    out: W,
}

impl<W: Write> DataUriExporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Exporter for DataUriExporter<W> {
    fn export(&mut self, doc: &GeneratedDocument) -> Result<(), ExportError> {
        writeln!(self.out, "{}", data_uri(doc)).map_err(ExportError::unavailable)
    }
}

/// Encode a document as a base64 `data:` URI
pub fn data_uri(doc: &GeneratedDocument) -> String {
    format!(
        "data:{};charset=utf-8;base64,{}",
        mime_type(doc.filename()),
        STANDARD.encode(doc.bytes())
    )
}

fn mime_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "application/octet-stream",
    }
}
