//! Text generation seam
//!
//! The language model is an external collaborator reached through
//! [`TextGenerator`]. [`OpenAiGenerator`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint; prompt assembly lives in [`prompt`].

mod openai;
pub mod prompt;

pub use openai::OpenAiGenerator;
pub use prompt::{build_messages, HISTORY_TURNS};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One `{role, content}` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Produces a completion for an ordered list of messages
pub trait TextGenerator: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
