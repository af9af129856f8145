//! Vector store seam - chunk types, collection traits and backends
//!
//! The nearest-neighbour index is an external collaborator. This module
//! defines the shape the core expects from it and owns the collection
//! lifecycle through [`CollectionAdapter`].
//!
//! Backends:
//! - [`MemoryStore`]: in-process, token-overlap ranking (tests, embedding-free use)
//! - [`SqliteStore`]: persistent, cosine ranking over vectors from an `EmbeddingEngine`

mod adapter;
mod memory;
mod sqlite;

pub use adapter::{CollectionAdapter, CollectionState, IngestRecord, INGEST_BATCH_SIZE};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Owner sentinel for globally visible chunks
pub const SYSTEM_OWNER: &str = "system";

/// Source name used when a chunk carries none
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Metadata stored alongside every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating document identifier (usually a file name)
    #[serde(default = "unknown_source")]
    pub source: String,
    /// Tenant the chunk is scoped to; `None` or `"system"` means public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Position of the chunk within its source document
    #[serde(default)]
    pub sequence: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
    /// Content kind: qa, theory, general, upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

fn unknown_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>, owner_id: Option<String>, sequence: usize) -> Self {
        Self {
            source: source.into(),
            owner_id,
            sequence,
            ingested_at: None,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_ingested_at(mut self, at: DateTime<Utc>) -> Self {
        self.ingested_at = Some(at);
        self
    }

    /// Concrete owner, or `None` for public chunks
    pub fn owner(&self) -> Option<&str> {
        match self.owner_id.as_deref() {
            None | Some("") | Some(SYSTEM_OWNER) => None,
            Some(owner) => Some(owner),
        }
    }

    /// Owner key used for listings (`system` for public chunks)
    pub fn owner_key(&self) -> &str {
        self.owner().unwrap_or(SYSTEM_OWNER)
    }
}

/// An immutable slice of source text as stored in a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    pub fn owner(&self) -> Option<&str> {
        self.metadata.owner()
    }

    pub fn sequence(&self) -> usize {
        self.metadata.sequence
    }
}

/// A chunk returned by a nearest-neighbour query, with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub chunk: Chunk,
    pub score: f32,
}

/// Query response, nested by query batch (one inner vec per query text)
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<ChunkMetadata>>,
    pub scores: Vec<Vec<f32>>,
}

impl QueryResponse {
    /// Flatten the first batch into candidates, preserving store order
    pub fn into_candidates(self) -> Vec<Candidate> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let documents = self.documents.into_iter().next().unwrap_or_default();
        let metadatas = self.metadatas.into_iter().next().unwrap_or_default();
        let scores = self.scores.into_iter().next().unwrap_or_default();

        ids.into_iter()
            .zip(documents)
            .zip(metadatas)
            .zip(scores)
            .map(|(((id, text), metadata), score)| Candidate {
                chunk: Chunk { id, text, metadata },
                score,
            })
            .collect()
    }
}

/// Handle to one named collection in a vector store
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Append chunks. The three slices must have equal length and ids must be unique.
    fn add(&self, documents: &[String], metadatas: &[ChunkMetadata], ids: &[String]) -> Result<()>;

    /// Return up to `n_results` nearest chunks per query text, best first
    fn query(&self, query_texts: &[&str], n_results: usize) -> Result<QueryResponse>;

    /// Metadata of every stored chunk (full scan)
    fn metadatas(&self) -> Result<Vec<ChunkMetadata>>;

    fn count(&self) -> Result<usize>;
}

/// A vector store that hosts named collections
pub trait VectorStore: Send + Sync {
    /// Open an existing collection; `None` if it was never created
    fn open(&self, name: &str) -> Result<Option<Arc<dyn Collection>>>;

    /// Create the collection if missing, then open it
    fn create_or_open(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// Delete a collection; returns whether it existed
    fn delete(&self, name: &str) -> Result<bool>;
}

/// Validate an `add` batch before touching storage
pub(crate) fn check_batch(
    documents: &[String],
    metadatas: &[ChunkMetadata],
    ids: &[String],
) -> Result<()> {
    if documents.len() != metadatas.len() || documents.len() != ids.len() {
        return Err(Error::store(
            "add",
            format!(
                "batch length mismatch: {} documents, {} metadatas, {} ids",
                documents.len(),
                metadatas.len(),
                ids.len()
            ),
        ));
    }
    if let Some(empty) = documents.iter().position(|d| d.is_empty()) {
        return Err(Error::store("add", format!("document {} is empty", ids[empty])));
    }
    Ok(())
}
