//! Collection lifecycle owned by one adapter per process
//!
//! The handle is looked up lazily and cached after the first success. A
//! missing collection is reported as [`CollectionState::NotReady`], never as
//! an error, so callers can answer with a retryable "still initializing".

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Candidate, ChunkMetadata, Collection, VectorStore};
use crate::chunker::Chunker;
use crate::error::{Error, Result};

/// Records per `add` call during bulk ingestion
pub const INGEST_BATCH_SIZE: usize = 100;

/// Lookup outcome for the backing collection
#[derive(Clone)]
pub enum CollectionState {
    Ready(Arc<dyn Collection>),
    NotReady,
}

impl CollectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, CollectionState::Ready(_))
    }
}

impl std::fmt::Debug for CollectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionState::Ready(c) => write!(f, "Ready({})", c.name()),
            CollectionState::NotReady => write!(f, "NotReady"),
        }
    }
}

/// A pre-built record for bulk ingestion (one record = one chunk)
#[derive(Debug, Clone)]
pub struct IngestRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Wraps a vector store and owns the lifecycle of one named collection
pub struct CollectionAdapter {
    store: Arc<dyn VectorStore>,
    name: String,
    chunker: Chunker,
    handle: RwLock<Option<Arc<dyn Collection>>>,
}

impl CollectionAdapter {
    pub fn new(store: Arc<dyn VectorStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            chunker: Chunker::default(),
            handle: RwLock::new(None),
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the cached handle, or look the collection up once.
    ///
    /// Two threads racing on first access may both open the collection; the
    /// store's open is idempotent so either handle is fine to keep.
    pub fn get_or_init(&self) -> Result<CollectionState> {
        if let Some(handle) = self.handle.read().as_ref() {
            return Ok(CollectionState::Ready(Arc::clone(handle)));
        }

        match self.store.open(&self.name)? {
            Some(handle) => {
                *self.handle.write() = Some(Arc::clone(&handle));
                Ok(CollectionState::Ready(handle))
            }
            None => {
                debug!(collection = %self.name, "collection not found");
                Ok(CollectionState::NotReady)
            }
        }
    }

    /// Ready handle or `Error::NotReady`
    pub fn ready(&self) -> Result<Arc<dyn Collection>> {
        match self.get_or_init()? {
            CollectionState::Ready(handle) => Ok(handle),
            CollectionState::NotReady => Err(Error::NotReady),
        }
    }

    /// Create the collection if missing and cache the handle
    pub fn create(&self) -> Result<Arc<dyn Collection>> {
        let handle = self.store.create_or_open(&self.name)?;
        *self.handle.write() = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop the collection and start fresh
    pub fn rebuild(&self) -> Result<Arc<dyn Collection>> {
        let mut cached = self.handle.write();
        *cached = None;
        if self.store.delete(&self.name)? {
            info!(collection = %self.name, "deleted existing collection");
        }
        let handle = self.store.create_or_open(&self.name)?;
        *cached = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Chunk a document and append it; returns the number of chunks stored.
    ///
    /// Every chunk gets a fresh random id, so re-ingesting a file adds a new
    /// copy instead of overwriting the old one.
    pub fn add_document(
        &self,
        content: &str,
        source: &str,
        owner_id: Option<&str>,
        kind: Option<&str>,
    ) -> Result<usize> {
        let collection = self.ready()?;

        if content.trim().is_empty() {
            return Err(Error::EmptyDocument {
                source_name: source.to_string(),
            });
        }

        let chunks = self.chunker.chunk(content);
        let now = Utc::now();
        let metadatas: Vec<ChunkMetadata> = (0..chunks.len())
            .map(|sequence| {
                let meta = ChunkMetadata::new(source, owner_id.map(String::from), sequence)
                    .with_ingested_at(now);
                match kind {
                    Some(k) => meta.with_kind(k),
                    None => meta,
                }
            })
            .collect();
        let ids: Vec<String> = chunks.iter().map(|_| Uuid::new_v4().to_string()).collect();

        collection.add(&chunks, &metadatas, &ids)?;
        info!(source, chunks = chunks.len(), owner = owner_id.unwrap_or("system"), "added document");
        Ok(chunks.len())
    }

    /// Append pre-built records in batches of [`INGEST_BATCH_SIZE`]
    pub fn add_records(&self, records: &[IngestRecord]) -> Result<usize> {
        let collection = self.ready()?;
        let records: Vec<&IngestRecord> = records.iter().filter(|r| !r.text.is_empty()).collect();

        for (n, batch) in records.chunks(INGEST_BATCH_SIZE).enumerate() {
            let documents: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
            let metadatas: Vec<ChunkMetadata> = batch.iter().map(|r| r.metadata.clone()).collect();
            let ids: Vec<String> = batch.iter().map(|_| Uuid::new_v4().to_string()).collect();
            debug!(batch = n, size = batch.len(), "upserting batch");
            collection.add(&documents, &metadatas, &ids)?;
        }

        Ok(records.len())
    }

    /// Nearest-neighbour candidates for `text`, in store order
    pub fn query(&self, text: &str, n: usize) -> Result<Vec<Candidate>> {
        let collection = self.ready()?;
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(collection.query(&[text], n)?.into_candidates())
    }

    /// Metadata of every chunk (full scan)
    pub fn all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
        self.ready()?.metadatas()
    }
}
