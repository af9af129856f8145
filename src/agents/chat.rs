//! Question answering with cited sources

use serde::Serialize;
use tracing::debug;

use super::{AgentContext, AgentRequest};
use crate::access::Role;
use crate::error::Result;
use crate::generator::build_messages;

const TEACHER_PERSONA: &str = "You are a teaching assistant for journalism and communication studies, working with university lecturers.
Style:
1. Professional, concise and objective; get straight to the point.
2. Analytical: offer several perspectives.
";

const STUDENT_PERSONA: &str = "You are a study companion for journalism and communication studies, working with university students.
Style:
1. Patient, friendly and thorough.
2. Use everyday examples to explain ideas.
3. Guide the student's thinking instead of only giving answers, and connect related concepts.
";

const WITH_KB: &str =
    "\nAnswer from the [Background knowledge]. Cite the sources strictly and do not invent facts.";
const WITHOUT_KB: &str = "\nAnswer from your own expertise. No background material is provided, but keep the style above.";

/// Generated answer plus the distinct sources it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Lecturers get the analytical persona; everyone else the tutoring one
pub(crate) fn persona(role: Role) -> &'static str {
    match role {
        Role::Teacher => TEACHER_PERSONA,
        Role::Student | Role::InternalTest => STUDENT_PERSONA,
    }
}

pub fn answer(ctx: &AgentContext, request: &AgentRequest) -> Result<ChatAnswer> {
    let background = ctx.background(request)?;

    let mut system_prompt = persona(request.principal.role).to_string();
    system_prompt.push_str(if request.use_kb { WITH_KB } else { WITHOUT_KB });

    let messages = build_messages(
        &system_prompt,
        &request.history,
        &request.query,
        &background.context(),
    );
    let answer = ctx.generator.complete(&messages)?;
    debug!(hits = background.len(), "chat answered");

    Ok(ChatAnswer {
        answer,
        sources: background.sources,
    })
}
