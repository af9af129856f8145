//! SQLite-backed vector store
//!
//! Chunks, metadata (JSON) and embeddings (little-endian f32 blobs) live in
//! one table. Queries embed the query text and rank every chunk of the
//! collection by cosine similarity; this is a brute-force scan, fine for a
//! course-sized knowledge base.

use parking_lot::Mutex;
use rayon::prelude::*;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use super::{check_batch, ChunkMetadata, Collection, QueryResponse, VectorStore};
use crate::embeddings::{bytes_to_vec, cosine_similarity, vec_to_bytes, EmbeddingEngine};
use crate::error::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chunks (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    collection TEXT NOT NULL,
    document TEXT NOT NULL,
    metadata TEXT NOT NULL,
    embedding BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
";

/// Persistent store; one connection shared by all collection handles
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingEngine>,
}

impl SqliteStore {
    /// Open (or create) a store file
    pub fn open<P: AsRef<Path>>(path: P, embedder: Arc<dyn EmbeddingEngine>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?, embedder)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory(embedder: Arc<dyn EmbeddingEngine>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn EmbeddingEngine>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    fn handle(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(SqliteCollection {
            name: name.to_string(),
            conn: Arc::clone(&self.conn),
            embedder: Arc::clone(&self.embedder),
        })
    }
}

impl VectorStore for SqliteStore {
    fn open(&self, name: &str) -> Result<Option<Arc<dyn Collection>>> {
        let exists = self
            .conn
            .lock()
            .query_row(
                "SELECT 1 FROM collections WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        Ok(exists.then(|| self.handle(name)))
    }

    fn create_or_open(&self, name: &str) -> Result<Arc<dyn Collection>> {
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(self.handle(name))
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE collection = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

/// Handle to one collection inside a [`SqliteStore`]
pub struct SqliteCollection {
    name: String,
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingEngine>,
}

struct StoredRow {
    id: String,
    document: String,
    metadata: String,
    embedding: Vec<f32>,
}

impl SqliteCollection {
    fn load_rows(&self) -> Result<Vec<StoredRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, document, metadata, embedding FROM chunks
             WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![self.name], |row| {
                let blob: Vec<u8> = row.get(3)?;
                Ok(StoredRow {
                    id: row.get(0)?,
                    document: row.get(1)?,
                    metadata: row.get(2)?,
                    embedding: bytes_to_vec(&blob),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl Collection for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, documents: &[String], metadatas: &[ChunkMetadata], ids: &[String]) -> Result<()> {
        check_batch(documents, metadatas, ids)?;
        if documents.is_empty() {
            return Ok(());
        }

        // Embed before taking the lock; the embedding call is the slow part
        let embeddings = self.embedder.embed_batch(documents)?;
        if embeddings.len() != documents.len() {
            return Err(Error::store(
                "add",
                format!(
                    "embedder returned {} vectors for {} documents",
                    embeddings.len(),
                    documents.len()
                ),
            ));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (id, collection, document, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (((document, metadata), id), embedding) in
                documents.iter().zip(metadatas).zip(ids).zip(&embeddings)
            {
                stmt.execute(params![
                    id,
                    self.name,
                    document,
                    serde_json::to_string(metadata)?,
                    vec_to_bytes(embedding),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn query(&self, query_texts: &[&str], n_results: usize) -> Result<QueryResponse> {
        let rows = self.load_rows()?;
        let mut response = QueryResponse::default();

        for text in query_texts {
            let query = self.embedder.embed_query(text)?;

            // Dimension mismatches and overflowing vectors rank last rather than failing the query
            let mut scored: Vec<(usize, f32)> = rows
                .par_iter()
                .enumerate()
                .map(|(i, row)| {
                    (
                        i,
                        cosine_similarity(&query, &row.embedding).unwrap_or(f32::MIN),
                    )
                })
                .collect();
            // Stable: ties keep insertion order
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(n_results);

            let mut ids = Vec::with_capacity(scored.len());
            let mut documents = Vec::with_capacity(scored.len());
            let mut metadatas = Vec::with_capacity(scored.len());
            let mut scores = Vec::with_capacity(scored.len());
            for (i, score) in scored {
                let row = &rows[i];
                ids.push(row.id.clone());
                documents.push(row.document.clone());
                metadatas.push(serde_json::from_str(&row.metadata)?);
                scores.push(score);
            }
            response.ids.push(ids);
            response.documents.push(documents);
            response.metadatas.push(metadatas);
            response.scores.push(scores);
        }

        Ok(response)
    }

    fn metadatas(&self) -> Result<Vec<ChunkMetadata>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT metadata FROM chunks WHERE collection = ?1 ORDER BY seq")?;
        let raw = stmt
            .query_map(params![self.name], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.iter()
            .map(|m| serde_json::from_str(m).map_err(Error::from))
            .collect()
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
