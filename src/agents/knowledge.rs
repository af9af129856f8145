//! Knowledge-base uploads and listings
//!
//! These never call the generator, so they take the store-side collaborators
//! directly instead of a full [`AgentContext`](super::AgentContext).

use serde::Serialize;
use std::path::Path;

use crate::access::Role;
use crate::documents::{file_name, TextExtractor};
use crate::error::Result;
use crate::retrieval::{Retriever, SourceListing};
use crate::store::CollectionAdapter;

/// `kind` recorded on chunks a user uploads under their own id
pub const UPLOAD_KIND: &str = "upload";

/// `kind` recorded on system-owned course material
pub const COURSE_KIND: &str = "general";

/// What an upload stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub source: String,
    pub owner_id: Option<String>,
    pub chunks: usize,
}

impl UploadReceipt {
    pub fn message(&self) -> String {
        format!(
            "Added {} ({} chunks) to the knowledge base",
            self.source, self.chunks
        )
    }
}

/// Extract, chunk and store one file under `owner_id` (`None` = system-owned)
pub fn upload(
    adapter: &CollectionAdapter,
    extractor: &dyn TextExtractor,
    path: &Path,
    owner_id: Option<&str>,
) -> Result<UploadReceipt> {
    let content = extractor.extract(path)?;
    upload_text(adapter, &file_name(path), &content, owner_id)
}

/// Store already-extracted text
pub fn upload_text(
    adapter: &CollectionAdapter,
    source: &str,
    content: &str,
    owner_id: Option<&str>,
) -> Result<UploadReceipt> {
    let kind = if owner_id.is_some() { UPLOAD_KIND } else { COURSE_KIND };
    let chunks = adapter.add_document(content, source, owner_id, Some(kind))?;
    Ok(UploadReceipt {
        source: source.to_string(),
        owner_id: owner_id.map(String::from),
        chunks,
    })
}

/// Owner -> source names visible to the caller
pub fn list(retriever: &Retriever, owner_id: Option<&str>, role: Role) -> Result<SourceListing> {
    retriever.list_sources(owner_id, role)
}
