//! In-process vector store
//!
//! Ranks by token overlap with the query instead of embeddings. Every stored
//! chunk is a candidate (like a nearest-neighbour index, it always returns up
//! to `n` results); equal scores keep insertion order.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{check_batch, ChunkMetadata, Collection, QueryResponse, VectorStore};
use crate::error::{Error, Result};

/// Store holding collections in memory
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryStore {
    fn open(&self, name: &str) -> Result<Option<Arc<dyn Collection>>> {
        Ok(self
            .collections
            .read()
            .get(name)
            .map(|c| c.clone() as Arc<dyn Collection>))
    }

    fn create_or_open(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let mut collections = self.collections.write();
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)));
        Ok(collection.clone())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.collections.write().remove(name).is_some())
    }
}

struct Row {
    id: String,
    document: String,
    metadata: ChunkMetadata,
    tokens: HashSet<String>,
}

/// Collection backed by a vector of rows in insertion order
pub struct MemoryCollection {
    name: String,
    rows: RwLock<Vec<Row>>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, documents: &[String], metadatas: &[ChunkMetadata], ids: &[String]) -> Result<()> {
        check_batch(documents, metadatas, ids)?;

        let mut rows = self.rows.write();
        let mut seen: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(Error::store("add", format!("duplicate id {}", id)));
            }
        }

        let new_rows: Vec<Row> = documents
            .iter()
            .zip(metadatas)
            .zip(ids)
            .map(|((document, metadata), id)| Row {
                id: id.clone(),
                document: document.clone(),
                metadata: metadata.clone(),
                tokens: tokens(document),
            })
            .collect();
        rows.extend(new_rows);
        Ok(())
    }

    fn query(&self, query_texts: &[&str], n_results: usize) -> Result<QueryResponse> {
        let rows = self.rows.read();
        let mut response = QueryResponse::default();

        for text in query_texts {
            let query_tokens = tokens(text);
            let mut scored: Vec<(usize, f32)> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| (i, overlap(&query_tokens, &row.tokens)))
                .collect();
            // Stable: equal scores stay in insertion order
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(n_results);

            response
                .ids
                .push(scored.iter().map(|(i, _)| rows[*i].id.clone()).collect());
            response
                .documents
                .push(scored.iter().map(|(i, _)| rows[*i].document.clone()).collect());
            response
                .metadatas
                .push(scored.iter().map(|(i, _)| rows[*i].metadata.clone()).collect());
            response
                .scores
                .push(scored.iter().map(|(_, s)| *s).collect());
        }

        Ok(response)
    }

    fn metadatas(&self) -> Result<Vec<ChunkMetadata>> {
        Ok(self.rows.read().iter().map(|r| r.metadata.clone()).collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rows.read().len())
    }
}

/// Lowercased word tokens; non-ASCII letters (e.g. CJK) count one token per character
fn tokens(text: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_lowercase());
            continue;
        }
        if !word.is_empty() {
            out.insert(std::mem::take(&mut word));
        }
        if c.is_alphanumeric() {
            out.insert(c.to_string());
        }
    }
    if !word.is_empty() {
        out.insert(word);
    }
    out
}

/// Fraction of query tokens present in the document (0.0 - 1.0)
fn overlap(query: &HashSet<String>, doc: &HashSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let hits = query.iter().filter(|t| doc.contains(*t)).count();
    hits as f32 / query.len() as f32
}
