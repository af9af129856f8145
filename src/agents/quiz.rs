//! Quiz generation (structured output is mandatory)

use serde::Serialize;
use tracing::{debug, warn};

use super::{AgentContext, AgentRequest};
use crate::access::Role;
use crate::error::Result;
use crate::extract::{extract_as, QuizQuestion, QuizSet};
use crate::generator::build_messages;

const QUIZ_SHAPE: &str = r#"{
  "questions": [
    {
      "id": 1,
      "type": "single_choice",
      "stem": "Question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "answer": "A",
      "analysis": "Explanation of the answer",
      "difficulty": "medium"
    }
  ]
}"#;

fn persona(role: Role) -> String {
    match role {
        Role::Teacher => format!(
            "You are an expert question writer for journalism and communication studies.
Requirements:
1. Follow the user's instruction (e.g. \"three multiple-choice questions on agenda setting\") for the number and type of questions.
2. The JSON must have this structure:
{}
3. If the user gives no count, write 1 question.
4. **Return only the JSON string**, without markdown fences.
",
            QUIZ_SHAPE
        ),
        Role::Student | Role::InternalTest => format!(
            "You are a tutor for journalism and communication studies.
Requirements:
1. Write practice questions for the student's request.
2. If no count is given, write 1 single-choice question.
3. If a count is given, honour it but never exceed 5 questions.
4. The JSON must have this structure, with hints in the analysis:
{}
5. **Return only the JSON string**, without markdown fences.
",
            QUIZ_SHAPE
        ),
    }
}

const WITH_KB: &str = "\nUsing the [Background knowledge] and the user's [Question] as the instruction, write a set of questions. The content must rest on the background knowledge and be accurate.";
const WITHOUT_KB: &str =
    "\nUsing the user's [Question] as the instruction and your own expertise, write a set of questions.";

/// Questions plus the sources they were drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizGeneration {
    pub questions: Vec<QuizQuestion>,
    pub sources: Vec<String>,
}

/// Fails with `Error::Extraction` when the output holds no valid quiz
pub fn generate(ctx: &AgentContext, request: &AgentRequest) -> Result<QuizGeneration> {
    let background = ctx.background(request)?;

    let mut system_prompt = persona(request.principal.role);
    system_prompt.push_str(if request.use_kb { WITH_KB } else { WITHOUT_KB });

    let messages = build_messages(
        &system_prompt,
        &request.history,
        &request.query,
        &background.context(),
    );
    let raw = ctx.generator.complete(&messages)?;

    let extracted = extract_as::<QuizSet>(&raw).inspect_err(|failure| {
        warn!(reason = %failure.reason, "quiz output rejected");
    })?;
    debug!(
        stage = %extracted.stage,
        questions = extracted.data.questions.len(),
        "quiz extracted"
    );

    Ok(QuizGeneration {
        questions: extracted.data.questions,
        sources: background.sources,
    })
}
