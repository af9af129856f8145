//! lectern - knowledge retrieval and structured output for a journalism
//! teaching assistant
//!
//! The core is two pieces: visibility-filtered retrieval over a shared,
//! multi-tenant knowledge base ([`retrieval`], [`access`], [`store`]) and
//! recovery of typed JSON from free-form generator text ([`extract`]).
//! [`agents`] composes them with a [`generator::TextGenerator`].

pub mod access;
pub mod agents;
pub mod chunker;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod generator;
pub mod retrieval;
pub mod store;

// Re-export commonly used types
pub use access::{AuditGrant, Principal, Role};
pub use config::Config;
pub use error::{Error, Result};
