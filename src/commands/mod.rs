//! CLI subcommands and the wiring they share

pub mod ask;
pub mod grade;
pub mod ingest;
pub mod quiz;
pub mod rubric;
pub mod sources;

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use lectern::agents::{AgentContext, AgentRequest};
use lectern::chunker::Chunker;
use lectern::embeddings::HttpEmbedder;
use lectern::generator::OpenAiGenerator;
use lectern::retrieval::{RetrievalConfig, Retriever};
use lectern::store::{CollectionAdapter, SqliteStore};
use lectern::{AuditGrant, Config, Principal, Role};

use crate::GlobalArgs;

pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    Config::load(global.config.as_deref()).context("Failed to load configuration")
}

/// Adapter over the configured sqlite store
pub(crate) fn open_adapter(config: &Config) -> Result<Arc<CollectionAdapter>> {
    let embedder = HttpEmbedder::new(&config.embeddings, None)
        .context("Failed to set up embedding client")?;
    let path = config.store.resolved_path()?;
    let store = SqliteStore::open(&path, Arc::new(embedder))
        .with_context(|| format!("Failed to open knowledge base at {}", path.display()))?;

    Ok(Arc::new(
        CollectionAdapter::new(Arc::new(store), config.store.collection.clone())
            .with_chunker(Chunker::new(config.chunking.window)),
    ))
}

pub(crate) fn open_retriever(config: &Config) -> Result<Retriever> {
    let retrieval = RetrievalConfig {
        k: config.retrieval.k,
        fetch_multiplier: config.retrieval.fetch_multiplier,
    };
    Ok(Retriever::with_config(open_adapter(config)?, retrieval))
}

/// Retriever plus generator; fails without an API key
pub(crate) fn agent_context(config: &Config) -> Result<AgentContext> {
    let generator = OpenAiGenerator::from_config(config)?;
    Ok(AgentContext::new(open_retriever(config)?, Arc::new(generator)))
}

pub(crate) fn role(global: &GlobalArgs) -> Result<Role> {
    global.role.parse::<Role>().map_err(anyhow::Error::msg)
}

pub(crate) fn principal(global: &GlobalArgs) -> Result<Principal> {
    let targets = (!global.targets.is_empty()).then(|| global.targets.clone());
    let principal = Principal::new(role(global)?, global.owner.clone()).with_targets(targets);

    Ok(if global.god_view {
        principal.with_audit_grant(AuditGrant::authorized())
    } else {
        principal
    })
}

pub(crate) fn request(global: &GlobalArgs, query: &str) -> Result<AgentRequest> {
    let request = AgentRequest::new(query, principal(global)?);
    Ok(if global.no_kb {
        request.without_kb()
    } else {
        request
    })
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
