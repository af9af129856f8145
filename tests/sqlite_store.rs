//! Persistent store: ingestion, reopening and filtered retrieval on disk

use std::sync::Arc;
use tempfile::TempDir;

use lectern::embeddings::EmbeddingEngine;
use lectern::retrieval::Retriever;
use lectern::store::{CollectionAdapter, SqliteStore};
use lectern::{Principal, Result, Role};

/// Bag-of-topics embedder over a fixed vocabulary
struct TopicEmbedder;

const TOPICS: &[&str] = &["agenda", "framing", "gatekeeping", "silence"];

impl EmbeddingEngine for TopicEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(TOPICS
            .iter()
            .map(|t| lower.matches(t).count() as f32)
            .collect())
    }

    fn model_name(&self) -> &str {
        "topics"
    }
}

fn open_adapter(dir: &TempDir) -> Arc<CollectionAdapter> {
    let store = SqliteStore::open(dir.path().join("kb").join("knowledge.db"), Arc::new(TopicEmbedder))
        .unwrap();
    Arc::new(CollectionAdapter::new(Arc::new(store), "journalism_knowledge"))
}

#[test]
fn test_documents_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let adapter = open_adapter(&dir);
        assert!(!adapter.get_or_init().unwrap().is_ready());
        adapter.create().unwrap();
        adapter
            .add_document("Framing: how news packages an issue.", "framing.md", None, None)
            .unwrap();
        adapter
            .add_document("My notes on framing effects.", "mine.md", Some("alice"), None)
            .unwrap();
    }

    let adapter = open_adapter(&dir);
    assert!(adapter.get_or_init().unwrap().is_ready());

    let retriever = Retriever::new(adapter);
    let result = retriever
        .retrieve_default("framing", &Principal::student("bob"))
        .unwrap();
    assert_eq!(result.sources, vec!["framing.md"]);

    let listing = retriever.list_sources(None, Role::InternalTest).unwrap();
    assert!(listing["alice"].contains("mine.md"));
    assert!(listing["system"].contains("framing.md"));
}

#[test]
fn test_ranking_follows_embedding_similarity() {
    let dir = TempDir::new().unwrap();
    let adapter = open_adapter(&dir);
    adapter.create().unwrap();
    adapter
        .add_document("Spiral of silence theory.", "silence.md", None, None)
        .unwrap();
    adapter
        .add_document("Gatekeeping in newsrooms.", "gatekeeping.md", None, None)
        .unwrap();

    let hits = adapter.query("who does gatekeeping?", 2).unwrap();
    assert_eq!(hits[0].chunk.source(), "gatekeeping.md");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn test_rebuild_starts_empty() {
    let dir = TempDir::new().unwrap();
    let adapter = open_adapter(&dir);
    adapter.create().unwrap();
    adapter
        .add_document("Agenda setting.", "a.md", None, None)
        .unwrap();

    adapter.rebuild().unwrap();
    assert_eq!(adapter.ready().unwrap().count().unwrap(), 0);
}
