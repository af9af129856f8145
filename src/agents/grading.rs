//! Batch grading of student documents
//!
//! With a rubric each document is scored against it; without one the
//! generator runs a qualitative self-check and scores stay at zero. A
//! document whose output cannot be extracted gets a zero-score placeholder
//! so one bad reply never sinks the batch.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::AgentContext;
use crate::documents::file_name;
use crate::error::Result;
use crate::extract::{extract_as, GradingOutcome, Rubric};
use crate::generator::ChatMessage;

/// Characters of student text sent to the generator
pub const PROMPT_TEXT_LIMIT: usize = 3000;
/// Characters of student text echoed back in each result
pub const ECHO_TEXT_LIMIT: usize = 2000;

/// Name the generator uses when it cannot tell who wrote the text
const UNKNOWN_STUDENT: &str = "Unknown";

const GRADING_QUERY: &str = "Grade this essay";

const OUTPUT_RULES: &str = "1. Return strict JSON.
2. Score every dimension and compute the total.
3. Give overall feedback.
4. Use this structure:
{
  \"student_name\": \"Unknown\",
  \"total_score\": 85,
  \"feedback\": \"Overall assessment...\",
  \"details\": {
    \"Dimension 1\": 25,
    \"Dimension 2\": 30
  }
}
5. **Return only the JSON string**.";

const SELF_CHECK_RULES: &str = "1. Return strict JSON.
2. Use this structure:
{
  \"student_name\": \"Unknown\",
  \"total_score\": 0,
  \"feedback\": \"Overall assessment...\",
  \"details\": {
    \"Thesis\": \"Comment...\",
    \"Evidence\": \"Comment...\",
    \"Logic\": \"Comment...\",
    \"Conventions\": \"Comment...\"
  }
}
3. **Return only the JSON string**.";

/// A student submission, already converted to text
#[derive(Debug, Clone)]
pub struct StudentDocument {
    pub filename: String,
    pub content: String,
}

impl StudentDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a file through the context's extractor
    pub fn load(ctx: &AgentContext, path: &Path) -> Result<Self> {
        Ok(Self::new(file_name(path), ctx.extractor.extract(path)?))
    }
}

/// Grade for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingResult {
    pub student_name: String,
    pub filename: String,
    pub total_score: f64,
    pub feedback: String,
    pub details: BTreeMap<String, serde_json::Value>,
    pub extracted_text: Option<String>,
}

/// Per-document results and their mean score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingReport {
    pub results: Vec<GradingResult>,
    pub average_score: f64,
}

/// Grade every document in order.
///
/// Generator errors abort the batch; extraction failures do not.
pub fn grade_batch(
    ctx: &AgentContext,
    documents: &[StudentDocument],
    rubric: Option<&Rubric>,
) -> Result<GradingReport> {
    let rubric_json = rubric.map(serde_json::to_string).transpose()?;

    let mut results = Vec::with_capacity(documents.len());
    for document in documents {
        let excerpt = truncate_chars(&document.content, PROMPT_TEXT_LIMIT);
        let system_prompt = match &rubric_json {
            Some(rubric_json) => grading_prompt(rubric_json, excerpt),
            None => self_check_prompt(excerpt),
        };

        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(GRADING_QUERY),
        ];
        let raw = ctx.generator.complete(&messages)?;
        results.push(to_result(document, &raw));
    }

    let average_score = average(&results);
    info!(documents = results.len(), average_score, "batch graded");
    Ok(GradingReport {
        results,
        average_score,
    })
}

fn to_result(document: &StudentDocument, raw: &str) -> GradingResult {
    match extract_as::<GradingOutcome>(raw) {
        Ok(extracted) => {
            let outcome = extracted.data;
            let student_name = if outcome.student_name == UNKNOWN_STUDENT {
                document.filename.clone()
            } else {
                outcome.student_name
            };
            GradingResult {
                student_name,
                filename: document.filename.clone(),
                total_score: outcome.total_score,
                feedback: outcome.feedback,
                details: outcome.details,
                extracted_text: Some(
                    truncate_chars(&document.content, ECHO_TEXT_LIMIT).to_string(),
                ),
            }
        }
        Err(failure) => {
            warn!(file = %document.filename, reason = %failure.reason, "grading output rejected");
            GradingResult {
                student_name: document.filename.clone(),
                filename: document.filename.clone(),
                total_score: 0.0,
                feedback: format!("Error: {}", failure),
                details: BTreeMap::new(),
                extracted_text: None,
            }
        }
    }
}

fn grading_prompt(rubric_json: &str, student_text: &str) -> String {
    format!(
        "You are a fair examiner.
Grade the [Student work] against the [Rubric] below.

[Rubric]:
{}

[Student work]:
{}

Requirements:
{}
",
        rubric_json, student_text, OUTPUT_RULES
    )
}

fn self_check_prompt(student_text: &str) -> String {
    format!(
        "You are an academic writing tutor.
Diagnose the [Student draft] below.
Do not score it. Give qualitative comments and revision advice on:
1. Thesis clarity
2. Evidence and argumentation
3. Logical structure
4. Academic conventions

[Student draft]:
{}

Requirements:
{}
",
        student_text, SELF_CHECK_RULES
    )
}

/// Mean of `total_score`, 0 for an empty batch
fn average(results: &[GradingResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.total_score).sum::<f64>() / results.len() as f64
}

/// Prefix of at most `limit` characters
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
