//! Shared fixtures for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use lectern::agents::AgentContext;
use lectern::generator::{ChatMessage, TextGenerator};
use lectern::retrieval::Retriever;
use lectern::store::{CollectionAdapter, MemoryStore};
use lectern::{Error, Result};

/// Generator that replays canned replies and records every prompt
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Vec<ChatMessage> {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().push(messages.to_vec());
        self.replies.lock().pop_front().ok_or_else(|| Error::Generator {
            stage: "script",
            message: "no scripted reply left".to_string(),
        })
    }
}

/// Ready adapter over an empty in-memory collection
pub fn empty_adapter() -> Arc<CollectionAdapter> {
    let adapter = Arc::new(CollectionAdapter::new(Arc::new(MemoryStore::new()), "kb"));
    adapter.create().expect("memory collection");
    adapter
}

/// Knowledge base with one public, one alice-owned and one bob-owned document
/// that all mention "agenda setting"
pub fn course_adapter() -> Arc<CollectionAdapter> {
    let adapter = empty_adapter();
    adapter
        .add_document(
            "Agenda setting theory: the media tell us what to think about.",
            "theory.md",
            None,
            None,
        )
        .unwrap();
    adapter
        .add_document(
            "Alice's notes on agenda setting and the Chapel Hill study.",
            "alice_notes.md",
            Some("alice"),
            None,
        )
        .unwrap();
    adapter
        .add_document(
            "Bob's draft about agenda setting in social media.",
            "bob_draft.md",
            Some("bob"),
            None,
        )
        .unwrap();
    adapter
}

pub fn context(adapter: Arc<CollectionAdapter>, generator: Arc<ScriptedGenerator>) -> AgentContext {
    AgentContext::new(Retriever::new(adapter), generator)
}
