//! Retriever - over-fetch, filter by visibility, truncate

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use super::result::{RetrievalResult, SourceListing};
use crate::access::{self, Principal, Role};
use crate::error::{Error, Result};
use crate::store::{CollectionAdapter, CollectionState, UNKNOWN_SOURCE};

/// Default number of chunks handed to a prompt
pub const DEFAULT_K: usize = 3;

/// Default over-fetch multiplier
pub const DEFAULT_FETCH_MULTIPLIER: usize = 3;

/// Retrieval configuration for Retriever
///
/// The over-fetch is a fixed multiplier, not adaptive. When a tenant's chunks
/// are sparse among the top `k * fetch_multiplier` candidates, fewer than `k`
/// results come back (approximate recall, not exact top-k-after-filter).
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Results per query when the caller does not say (default: 3)
    pub k: usize,
    /// Over-fetch multiplier to absorb filtering losses (default: 3)
    pub fetch_multiplier: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            fetch_multiplier: DEFAULT_FETCH_MULTIPLIER,
        }
    }
}

/// Input to [`Retriever::retrieve`]
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub text: String,
    pub k: usize,
    pub principal: Principal,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>, k: usize, principal: Principal) -> Self {
        Self {
            text: text.into(),
            k,
            principal,
        }
    }
}

/// Retrieval orchestrator over a shared collection adapter
pub struct Retriever {
    adapter: Arc<CollectionAdapter>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Create retriever with default config
    pub fn new(adapter: Arc<CollectionAdapter>) -> Self {
        Self::with_config(adapter, RetrievalConfig::default())
    }

    pub fn with_config(adapter: Arc<CollectionAdapter>, config: RetrievalConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn adapter(&self) -> &CollectionAdapter {
        &self.adapter
    }

    /// Filtered top-k retrieval.
    ///
    /// Never returns a chunk the principal may not see, even if that leaves
    /// the result short or empty. An empty result is not an error.
    pub fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult> {
        let collection = match self.adapter.get_or_init()? {
            CollectionState::Ready(collection) => collection,
            CollectionState::NotReady => return Err(Error::NotReady),
        };

        if query.k == 0 {
            return Ok(RetrievalResult::default());
        }

        // Over-fetch to absorb filtering losses
        let fetch_limit = query.k.saturating_mul(self.config.fetch_multiplier.max(1));
        let candidates = collection
            .query(&[query.text.as_str()], fetch_limit)?
            .into_candidates();
        let fetched = candidates.len();

        let mut hits = access::filter(candidates, &query.principal);
        let visible = hits.len();
        hits.truncate(query.k);

        debug!(
            fetched,
            visible,
            returned = hits.len(),
            role = %query.principal.role,
            "retrieval filtered"
        );

        Ok(RetrievalResult::from_hits(hits))
    }

    /// Retrieve with the configured default k
    pub fn retrieve_default(&self, text: &str, principal: &Principal) -> Result<RetrievalResult> {
        self.retrieve(&RetrievalQuery::new(text, self.config.k, principal.clone()))
    }

    /// Owner -> source names over every stored chunk (full scan).
    ///
    /// Non-`internal_test` callers that name an owner see only that owner's
    /// sources; everyone else gets the whole map. Returns an empty map while
    /// the collection does not exist.
    pub fn list_sources(&self, owner_id: Option<&str>, role: Role) -> Result<SourceListing> {
        let collection = match self.adapter.get_or_init()? {
            CollectionState::Ready(collection) => collection,
            CollectionState::NotReady => return Ok(SourceListing::new()),
        };

        let restrict_to = match (role, owner_id) {
            (Role::InternalTest, _) => None,
            (_, owner) => owner,
        };

        let mut listing: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for meta in collection.metadatas()? {
            let owner = meta.owner_key();
            if restrict_to.is_some_and(|wanted| wanted != owner) {
                continue;
            }
            let source = if meta.source.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                meta.source.clone()
            };
            listing.entry(owner.to_string()).or_default().insert(source);
        }

        Ok(listing)
    }
}
