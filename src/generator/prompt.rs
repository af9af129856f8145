//! Message assembly for generator calls

use super::ChatMessage;

/// Most recent history messages carried into a prompt
pub const HISTORY_TURNS: usize = 4;

/// System persona, the last [`HISTORY_TURNS`] history messages, then one user
/// message carrying the background knowledge and the question.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    query: &str,
    context: &str,
) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(recent.iter().cloned());
    messages.push(ChatMessage::user(user_prompt(query, context)));
    messages
}

fn user_prompt(query: &str, context: &str) -> String {
    format!(
        "\n[Background knowledge]:\n{}\n\n[Question]:\n{}\n",
        context, query
    )
}
