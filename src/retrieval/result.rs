//! Retrieval results with source attribution

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::store::Candidate;

/// Owner id -> source names visible in a listing
pub type SourceListing = BTreeMap<String, BTreeSet<String>>;

/// Filtered, truncated hits plus deduplicated sources for citation
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    /// Relevance-descending as returned by the store
    pub hits: Vec<Candidate>,
    /// Distinct `source` values in first-seen order
    pub sources: Vec<String>,
}

impl RetrievalResult {
    pub fn from_hits(hits: Vec<Candidate>) -> Self {
        let sources = dedup_sources(&hits);
        Self { hits, sources }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Prompt context: one `Source (<name>):` block per hit, blank-line separated
    pub fn context(&self) -> String {
        self.hits
            .iter()
            .map(|hit| format!("Source ({}):\n{}", hit.chunk.source(), hit.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Bare chunk texts joined by newlines (rubric prompts embed these directly)
    pub fn plain_text(&self) -> String {
        self.hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Distinct sources of `hits`, insertion order preserved
pub fn dedup_sources(hits: &[Candidate]) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.iter()
        .map(|hit| hit.chunk.source())
        .filter(|source| seen.insert(*source))
        .map(String::from)
        .collect()
}
