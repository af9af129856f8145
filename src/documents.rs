//! Document text extraction for ingestion and grading
//!
//! Binary formats (PDF, DOCX) need an external extractor plugged in through
//! [`TextExtractor`]; the built-in one reads UTF-8 text files only.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Turns a file into plain text
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor handles the file at all
    fn supports(&self, path: &Path) -> bool;

    /// Plain text of the file. Empty or whitespace-only output is an
    /// `EmptyDocument` error.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// UTF-8 `.txt` and `.md` files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

impl TextExtractor for PlainTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn extract(&self, path: &Path) -> Result<String> {
        if !self.supports(path) {
            return Err(Error::UnsupportedFormat {
                file: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(Error::EmptyDocument {
                source_name: file_name(path),
            });
        }
        Ok(content)
    }
}

/// Final path component, used as the `source` of ingested chunks
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
