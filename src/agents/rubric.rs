//! Rubric design: prose answers with an optional tagged rubric payload

use serde::Serialize;

use super::{AgentContext, AgentRequest};
use crate::error::Result;
use crate::extract::{extract_hybrid, Rubric, RUBRIC_TAG};
use crate::generator::build_messages;

/// Shown when the reply held nothing but the rubric block
pub const RUBRIC_READY: &str = "The rubric is ready; see the structured view.";

fn persona() -> String {
    format!(
        "You are an expert in educational assessment.
Requirements:
1. **Hybrid output**:
   - If the user is only asking or chatting, answer in plain text.
   - If the user asks to create or revise a rubric, wrap the JSON in `<{tag}>` and `</{tag}>` tags and give a short explanation outside the tags.
2. **JSON structure (inside the tags only)**:
{{
  \"title\": \"Rubric title\",
  \"items\": [
    {{
      \"criterion\": \"Dimension name\",
      \"weight\": 30,
      \"description\": \"Scoring details...\"
    }}
  ]
}}
3. Use 3-5 dimensions whose weights sum to 100.
",
        tag = RUBRIC_TAG
    )
}

/// Prose reply and the rubric, when one was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricGeneration {
    pub message: String,
    pub rubric: Option<Rubric>,
}

/// Never fails on malformed output; the reply degrades to prose instead
pub fn generate(ctx: &AgentContext, request: &AgentRequest) -> Result<RubricGeneration> {
    let background = ctx.background(request)?;
    let reference = background.plain_text();

    let mut system_prompt = persona();
    if request.use_kb && !reference.is_empty() {
        system_prompt.push_str(&format!(
            "\nFollowing the user's requirements and the [Reference material] below, create or refine a rubric for [{}].\n\n[Reference material]:\n{}",
            request.query, reference
        ));
    } else {
        system_prompt.push_str(&format!(
            "\nFollowing the user's requirements, create or refine a rubric for [{}].",
            request.query
        ));
    }

    // Reference material already sits in the system prompt
    let messages = build_messages(&system_prompt, &request.history, &request.query, "");
    let raw = ctx.generator.complete(&messages)?;

    let hybrid = extract_hybrid::<Rubric>(&raw, RUBRIC_READY);
    Ok(RubricGeneration {
        message: hybrid.message,
        rubric: hybrid.data,
    })
}
