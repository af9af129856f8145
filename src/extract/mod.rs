//! Structured-output extraction from free-form generator text
//!
//! Generator output is untrusted input: it may hold no JSON, malformed JSON,
//! or JSON wrapped in commentary. Extraction runs a fixed chain of stages
//! (tagged → whole string → embedded object), then validates the result
//! against a typed schema. Every failure comes back as an
//! [`ExtractionFailure`] carrying the raw text; callers decide whether that is
//! fatal (quiz, grading) or degradable (hybrid rubric output).
//!
//! ```
//! use lectern::extract::{extract_json, Pipeline, Stage};
//!
//! let parsed = extract_json("Some prose {\"a\":1} more prose", &Pipeline::bare()).unwrap();
//! assert_eq!(parsed.stage, Stage::Embedded);
//! ```

mod schema;
mod stages;

pub use schema::{
    GradingOutcome, QuizQuestion, QuizSet, Rubric, RubricItem, Schema, SchemaKind, Structured,
    RUBRIC_TAG,
};
pub use stages::{strip_fence, ParsedJson, Pipeline, Stage, TagPair};

use std::fmt;
use tracing::warn;

/// Why extraction failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No JSON object could be located
    NoJson,
    /// The expected delimiter pair was absent
    MissingTags,
    /// A candidate span was found but is not valid JSON
    Malformed(String),
    /// Valid JSON that does not match the target schema
    Schema(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoJson => write!(f, "no JSON object found"),
            FailureReason::MissingTags => write!(f, "expected delimiter tags not found"),
            FailureReason::Malformed(e) => write!(f, "malformed JSON: {}", e),
            FailureReason::Schema(e) => write!(f, "schema mismatch: {}", e),
        }
    }
}

/// Generator output that did not yield a schema-valid JSON object
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not extract structured output ({reason})")]
pub struct ExtractionFailure {
    /// The untouched generator output, for logging or prose fallback
    pub raw: String,
    pub reason: FailureReason,
    /// Last stage attempted (the one that succeeded, for schema failures)
    pub stage: Option<Stage>,
}

/// A schema-valid result and how it was found
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub data: T,
    pub stage: Stage,
    /// Prose outside the tag blocks, for tagged extraction
    pub residual: Option<String>,
}

/// Locate JSON in `raw` with the given pipeline, without schema checks
pub fn extract_json(raw: &str, pipeline: &Pipeline) -> Result<ParsedJson, ExtractionFailure> {
    pipeline.run(raw)
}

/// Extract and validate against `T`'s schema using its default pipeline
pub fn extract_as<T: Schema>(raw: &str) -> Result<Extracted<T>, ExtractionFailure> {
    extract_with::<T>(raw, &T::KIND.pipeline())
}

/// Extract and validate against `T` with an explicit pipeline
pub fn extract_with<T: Schema>(
    raw: &str,
    pipeline: &Pipeline,
) -> Result<Extracted<T>, ExtractionFailure> {
    let parsed = pipeline.run(raw)?;
    let schema_failure = |message: String| ExtractionFailure {
        raw: raw.to_string(),
        reason: FailureReason::Schema(message),
        stage: Some(parsed.stage),
    };

    let data: T = serde_json::from_value(parsed.value.clone())
        .map_err(|e| schema_failure(e.to_string()))?;
    data.validate().map_err(schema_failure)?;

    Ok(Extracted {
        data,
        stage: parsed.stage,
        residual: parsed.residual,
    })
}

/// Extract any of the three schemas by kind
pub fn extract(raw: &str, kind: SchemaKind) -> Result<Extracted<Structured>, ExtractionFailure> {
    fn wrap<T>(e: Extracted<T>, f: impl FnOnce(T) -> Structured) -> Extracted<Structured> {
        Extracted {
            data: f(e.data),
            stage: e.stage,
            residual: e.residual,
        }
    }

    match kind {
        SchemaKind::Quiz => extract_as::<QuizSet>(raw).map(|e| wrap(e, Structured::Quiz)),
        SchemaKind::Rubric => extract_as::<Rubric>(raw).map(|e| wrap(e, Structured::Rubric)),
        SchemaKind::Grading => {
            extract_as::<GradingOutcome>(raw).map(|e| wrap(e, Structured::Grading))
        }
    }
}

/// Prose plus optional structured payload from hybrid output
#[derive(Debug, Clone, PartialEq)]
pub struct Hybrid<T> {
    pub message: String,
    pub data: Option<T>,
}

/// Hybrid extraction: never fails.
///
/// On success the message is the prose left after removing the tag blocks
/// (or `empty_message` when nothing is left). On failure the whole raw text
/// becomes the message and `data` is `None`.
pub fn extract_hybrid<T: Schema>(raw: &str, empty_message: &str) -> Hybrid<T> {
    match extract_as::<T>(raw) {
        Ok(extracted) => {
            let message = extracted
                .residual
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| empty_message.to_string());
            Hybrid {
                message,
                data: Some(extracted.data),
            }
        }
        Err(failure) => {
            if failure.reason != FailureReason::MissingTags {
                warn!(schema = %T::KIND, reason = %failure.reason, "hybrid output degraded to text");
            }
            Hybrid {
                message: raw.to_string(),
                data: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RUBRIC: &str = r#"{"title":"News feature","items":[{"criterion":"Lead","weight":40,"description":"Hooks the reader"},{"criterion":"Sourcing","weight":60,"description":"Named sources"}]}"#;

    #[test]
    fn test_bare_json() {
        let parsed = extract_json("{\"a\":1}", &Pipeline::bare()).unwrap();
        assert_eq!(parsed.value, json!({"a": 1}));
        assert_eq!(parsed.stage, Stage::Whole);
    }

    #[test]
    fn test_schema_mismatch_is_failure() {
        let failure = extract(r#"{"questions":[{"id":"one"}]}"#, SchemaKind::Quiz).unwrap_err();
        assert!(matches!(failure.reason, FailureReason::Schema(_)));
        assert_eq!(failure.stage, Some(Stage::Whole));
    }

    #[test]
    fn test_extract_dispatches_on_kind() {
        let raw = format!("<RUBRIC_JSON>{}</RUBRIC_JSON>", RUBRIC);
        let extracted = extract(&raw, SchemaKind::Rubric).unwrap();
        match extracted.data {
            Structured::Rubric(r) => assert_eq!(r.total_weight(), 100),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rubric_requires_tags() {
        let failure = extract(RUBRIC, SchemaKind::Rubric).unwrap_err();
        assert_eq!(failure.reason, FailureReason::MissingTags);
    }

    #[test]
    fn test_hybrid_with_only_tag_block_uses_default_message() {
        let raw = format!("<RUBRIC_JSON>{}</RUBRIC_JSON>", RUBRIC);
        let hybrid: Hybrid<Rubric> = extract_hybrid(&raw, "Rubric ready.");
        assert_eq!(hybrid.message, "Rubric ready.");
        assert!(hybrid.data.is_some());
    }

    #[test]
    fn test_hybrid_degrades_to_prose() {
        let raw = "A rubric usually has three to five criteria.";
        let hybrid: Hybrid<Rubric> = extract_hybrid(raw, "unused");
        assert_eq!(hybrid.message, raw);
        assert!(hybrid.data.is_none());
    }

    #[test]
    fn test_hybrid_malformed_inside_tags_degrades() {
        let raw = "Here:\n<RUBRIC_JSON>{\"title\": }</RUBRIC_JSON>";
        let hybrid: Hybrid<Rubric> = extract_hybrid(raw, "unused");
        assert_eq!(hybrid.message, raw);
        assert!(hybrid.data.is_none());
    }

    #[test]
    fn test_failure_display() {
        let failure = extract("nothing", SchemaKind::Grading).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "could not extract structured output (no JSON object found)"
        );
    }
}
