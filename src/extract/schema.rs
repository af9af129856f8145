//! Target schemas for structured generator output
//!
//! Deserialization is strict: missing required keys and wrong field types
//! are failures, never coerced.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use super::stages::{Pipeline, Stage, TagPair};

/// Delimiter name wrapping rubric JSON in hybrid output
pub const RUBRIC_TAG: &str = "RUBRIC_JSON";

/// Which schema a caller expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Quiz,
    Rubric,
    Grading,
}

impl SchemaKind {
    /// Stage chain for this schema.
    ///
    /// Rubric output is hybrid prose + tagged JSON; quiz and grading output is
    /// supposed to be bare JSON.
    pub fn pipeline(self) -> Pipeline {
        match self {
            SchemaKind::Rubric => Pipeline::new(vec![Stage::Tagged]).with_tags(TagPair::new(RUBRIC_TAG)),
            SchemaKind::Quiz | SchemaKind::Grading => Pipeline::bare(),
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaKind::Quiz => "quiz",
            SchemaKind::Rubric => "rubric",
            SchemaKind::Grading => "grading",
        })
    }
}

/// A typed target for extraction
pub trait Schema: DeserializeOwned {
    const KIND: SchemaKind;

    /// Checks beyond what deserialization enforces
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// =============================================================================
// Quiz
// =============================================================================

/// `{"questions": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSet {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: String,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    pub analysis: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_question_type() -> String {
    "single_choice".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

impl Schema for QuizSet {
    const KIND: SchemaKind = SchemaKind::Quiz;
}

// =============================================================================
// Rubric
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub title: String,
    pub items: Vec<RubricItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricItem {
    pub criterion: String,
    pub weight: i64,
    pub description: String,
}

impl Rubric {
    pub fn total_weight(&self) -> i64 {
        self.items.iter().map(|i| i.weight).sum()
    }
}

impl Schema for Rubric {
    const KIND: SchemaKind = SchemaKind::Rubric;

    fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("rubric has no items".to_string());
        }
        let total = self.total_weight();
        if total != 100 {
            warn!(total, title = %self.title, "rubric weights do not sum to 100");
        }
        Ok(())
    }
}

// =============================================================================
// Grading
// =============================================================================

/// Per-document grading output from the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingOutcome {
    pub student_name: String,
    pub total_score: f64,
    pub feedback: String,
    /// criterion -> score (rubric grading) or comment (self-check mode)
    pub details: BTreeMap<String, serde_json::Value>,
}

impl Schema for GradingOutcome {
    const KIND: SchemaKind = SchemaKind::Grading;

    fn validate(&self) -> Result<(), String> {
        if !self.total_score.is_finite() {
            return Err("total_score is not a finite number".to_string());
        }
        for (criterion, value) in &self.details {
            if !(value.is_number() || value.is_string()) {
                return Err(format!(
                    "details.{} must be a number or a string",
                    criterion
                ));
            }
        }
        Ok(())
    }
}

/// Any of the three schemas, for callers that dispatch on [`SchemaKind`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Structured {
    Quiz(QuizSet),
    Rubric(Rubric),
    Grading(GradingOutcome),
}
