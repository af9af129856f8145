//! Retrieval module - visibility-filtered knowledge retrieval
//!
//! Public interface:
//! - `Retriever` for filtered top-k queries and per-owner source listings
//! - `RetrievalConfig` for the over-fetch multiplier and default k
//! - `RetrievalQuery` / `RetrievalResult` for inputs and attributed results

mod engine;
mod result;

pub use engine::{RetrievalConfig, RetrievalQuery, Retriever, DEFAULT_FETCH_MULTIPLIER, DEFAULT_K};
pub use result::{dedup_sources, RetrievalResult, SourceListing};
