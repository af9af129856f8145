//! Teaching-assistant agents
//!
//! Each agent is a thin composition of the core: optional retrieval under the
//! caller's [`Principal`], one generator call with a role-specific persona,
//! then (for structured agents) extraction of a typed payload.
//!
//! - [`chat`] - free-form answers with cited sources
//! - [`quiz`] - quiz questions, JSON required
//! - [`rubric`] - grading rubrics, prose with an optional tagged payload
//! - [`grading`] - batch grading of student documents
//! - [`knowledge`] - uploading and listing knowledge-base documents

pub mod chat;
pub mod grading;
pub mod knowledge;
pub mod quiz;
pub mod rubric;

pub use chat::ChatAnswer;
pub use grading::{GradingReport, GradingResult, StudentDocument};
pub use knowledge::UploadReceipt;
pub use quiz::QuizGeneration;
pub use rubric::RubricGeneration;

use std::sync::Arc;

use crate::access::Principal;
use crate::documents::{PlainTextExtractor, TextExtractor};
use crate::error::Result;
use crate::generator::{ChatMessage, TextGenerator};
use crate::retrieval::{RetrievalResult, Retriever};

/// Collaborators shared by every agent
pub struct AgentContext {
    pub retriever: Retriever,
    pub generator: Arc<dyn TextGenerator>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AgentContext {
    pub fn new(retriever: Retriever, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            retriever,
            generator,
            extractor: Arc::new(PlainTextExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Retrieval for a request, or an empty result when the knowledge base
    /// is switched off
    pub(crate) fn background(&self, request: &AgentRequest) -> Result<RetrievalResult> {
        if !request.use_kb {
            return Ok(RetrievalResult::default());
        }
        self.retriever
            .retrieve_default(&request.query, &request.principal)
    }
}

/// One conversational request
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub query: String,
    pub history: Vec<ChatMessage>,
    pub principal: Principal,
    /// Ground the answer in the knowledge base
    pub use_kb: bool,
}

impl AgentRequest {
    pub fn new(query: impl Into<String>, principal: Principal) -> Self {
        Self {
            query: query.into(),
            history: Vec::new(),
            principal,
            use_kb: true,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn without_kb(mut self) -> Self {
        self.use_kb = false;
        self
    }
}
