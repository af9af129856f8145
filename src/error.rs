//! Error types for the retrieval and extraction core
//!
//! Library code returns `lectern::Result`; the CLI wraps these in `anyhow`.

use std::path::PathBuf;

use crate::extract::ExtractionFailure;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core and its external collaborators
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing collection has not been created yet. Retryable.
    #[error("knowledge base is still initializing, try again later")]
    NotReady,

    /// Missing or invalid configuration (e.g. no generator API key). Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Generator output did not yield a schema-valid JSON object
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error("vector store failed during {stage}: {message}")]
    Store { stage: &'static str, message: String },

    #[error("text generator failed during {stage}: {message}")]
    Generator { stage: &'static str, message: String },

    #[error("embedding service failed during {stage}: {message}")]
    Embedding { stage: &'static str, message: String },

    /// An external call exceeded its configured timeout. Retryable.
    #[error("{service} timed out")]
    Timeout { service: &'static str },

    #[error("document {source_name} is empty or could not be read")]
    EmptyDocument { source_name: String },

    #[error("unsupported document format: {}", file.display())]
    UnsupportedFormat { file: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotReady | Error::Timeout { .. })
    }

    pub(crate) fn store(stage: &'static str, message: impl ToString) -> Self {
        Error::Store {
            stage,
            message: message.to_string(),
        }
    }

    /// Map a failed HTTP call to `Timeout` or the service's own variant
    pub(crate) fn http(service: Service, stage: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Error::Timeout {
                service: service.name(),
            };
        }
        let message = err.to_string();
        match service {
            Service::Generator => Error::Generator { stage, message },
            Service::Embedding => Error::Embedding { stage, message },
        }
    }
}

/// External HTTP services the core calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Generator,
    Embedding,
}

impl Service {
    fn name(self) -> &'static str {
        match self {
            Service::Generator => "text generator",
            Service::Embedding => "embedding service",
        }
    }
}
