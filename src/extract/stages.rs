//! Extraction stages and the ordered pipeline that runs them
//!
//! Each stage is a fallible parser over the raw text. The pipeline tries
//! them in order and stops at the first success.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::{ExtractionFailure, FailureReason};

/// One way of locating JSON in generator output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Between a `<TAG>` / `</TAG>` pair, optionally fenced inside
    Tagged,
    /// The whole text, after stripping a code fence
    Whole,
    /// From the first `{` to the last `}`
    Embedded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Tagged => "tagged",
            Stage::Whole => "whole",
            Stage::Embedded => "embedded",
        })
    }
}

/// A `<NAME>` ... `</NAME>` delimiter pair
#[derive(Debug, Clone)]
pub struct TagPair {
    name: String,
    block: Regex,
}

impl TagPair {
    pub fn new(name: &str) -> Self {
        let escaped = regex::escape(name);
        let block = Regex::new(&format!("(?s)<{0}>(.*?)</{0}>", escaped))
            .expect("escaped tag name is a valid regex");
        Self {
            name: name.to_string(),
            block,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contents of the first tag block, if any
    fn inner<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.block
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// `raw` with every tag block removed, trimmed
    pub fn strip_blocks(&self, raw: &str) -> String {
        self.block.replace_all(raw, "").trim().to_string()
    }
}

/// JSON recovered by one stage
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJson {
    pub value: Value,
    pub stage: Stage,
    /// Text outside the tag blocks (tagged stage only)
    pub residual: Option<String>,
}

/// Ordered chain of stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    tags: Option<TagPair>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages, tags: None }
    }

    /// Whole-string parse, then embedded-object scan
    pub fn bare() -> Self {
        Self::new(vec![Stage::Whole, Stage::Embedded])
    }

    /// Tagged first, falling back to the bare stages
    pub fn tagged_then_bare(tag: &str) -> Self {
        Self::new(vec![Stage::Tagged, Stage::Whole, Stage::Embedded]).with_tags(TagPair::new(tag))
    }

    pub fn with_tags(mut self, tags: TagPair) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn tags(&self) -> Option<&TagPair> {
        self.tags.as_ref()
    }

    /// Run stages in order; the first success wins
    pub fn run(&self, raw: &str) -> Result<ParsedJson, ExtractionFailure> {
        let mut last = (None, FailureReason::NoJson);

        for &stage in &self.stages {
            let attempt = match stage {
                Stage::Tagged => self.try_tagged(raw),
                Stage::Whole => try_whole(raw),
                Stage::Embedded => try_embedded(raw),
            };
            match attempt {
                Ok(parsed) => {
                    debug!(%stage, "extracted JSON");
                    return Ok(parsed);
                }
                Err(reason) => {
                    debug!(%stage, %reason, "extraction stage failed");
                    last = (Some(stage), reason);
                }
            }
        }

        Err(ExtractionFailure {
            raw: raw.to_string(),
            stage: last.0,
            reason: last.1,
        })
    }

    fn try_tagged(&self, raw: &str) -> Result<ParsedJson, FailureReason> {
        let tags = self.tags.as_ref().ok_or(FailureReason::MissingTags)?;
        let inner = tags.inner(raw).ok_or(FailureReason::MissingTags)?;
        let value = parse_strict(strip_fence(inner))?;
        Ok(ParsedJson {
            value,
            stage: Stage::Tagged,
            residual: Some(tags.strip_blocks(raw)),
        })
    }
}

fn try_whole(raw: &str) -> Result<ParsedJson, FailureReason> {
    let value = parse_strict(strip_fence(raw))?;
    Ok(ParsedJson {
        value,
        stage: Stage::Whole,
        residual: None,
    })
}

fn try_embedded(raw: &str) -> Result<ParsedJson, FailureReason> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(FailureReason::NoJson);
    };
    if end < start {
        return Err(FailureReason::NoJson);
    }
    let value = parse_strict(&raw[start..=end])?;
    Ok(ParsedJson {
        value,
        stage: Stage::Embedded,
        residual: None,
    })
}

fn parse_strict(text: &str) -> Result<Value, FailureReason> {
    if text.trim().is_empty() {
        return Err(FailureReason::NoJson);
    }
    serde_json::from_str(text).map_err(|e| FailureReason::Malformed(e.to_string()))
}

/// Remove a surrounding ```` ``` ```` or ```` ```json ```` fence, if present
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fence_variants() {
        assert_eq!(strip_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_whole_stage() {
        let parsed = try_whole("{\"a\":1}").unwrap();
        assert_eq!(parsed.value, json!({"a": 1}));
        assert_eq!(parsed.stage, Stage::Whole);
    }

    #[test]
    fn test_whole_stage_rejects_prose() {
        assert!(matches!(
            try_whole("Here you go: {\"a\":1}"),
            Err(FailureReason::Malformed(_))
        ));
    }

    #[test]
    fn test_embedded_stage() {
        let parsed = try_embedded("Some prose {\"a\":1} more prose").unwrap();
        assert_eq!(parsed.value, json!({"a": 1}));
    }

    #[test]
    fn test_embedded_stage_spans_first_to_last_brace() {
        // Two objects: the span covers both and is not valid JSON
        assert!(try_embedded("{\"a\":1} and {\"b\":2}").is_err());
    }

    #[test]
    fn test_embedded_stage_without_braces() {
        assert_eq!(try_embedded("no json here"), Err(FailureReason::NoJson));
        assert_eq!(try_embedded("} backwards {"), Err(FailureReason::NoJson));
    }

    #[test]
    fn test_tagged_stage_strips_fence_and_blocks() {
        let pipeline = Pipeline::new(vec![Stage::Tagged]).with_tags(TagPair::new("RUBRIC_JSON"));
        let raw = "Intro.\n<RUBRIC_JSON>```json\n{\"a\":1}\n```</RUBRIC_JSON>\nDone.";
        let parsed = pipeline.run(raw).unwrap();
        assert_eq!(parsed.value, json!({"a": 1}));
        assert_eq!(parsed.residual.as_deref(), Some("Intro.\n\nDone."));
    }

    #[test]
    fn test_tagged_stage_without_tags_fails() {
        let pipeline = Pipeline::new(vec![Stage::Tagged]).with_tags(TagPair::new("RUBRIC_JSON"));
        let failure = pipeline.run("{\"a\":1}").unwrap_err();
        assert_eq!(failure.reason, FailureReason::MissingTags);
        assert_eq!(failure.stage, Some(Stage::Tagged));
    }

    #[test]
    fn test_tagged_then_bare_falls_back() {
        let parsed = Pipeline::tagged_then_bare("DATA").run("{\"a\":1}").unwrap();
        assert_eq!(parsed.stage, Stage::Whole);
    }

    #[test]
    fn test_pipeline_short_circuits_in_order() {
        // Valid as a whole string, so the embedded stage never runs
        let parsed = Pipeline::bare().run("  {\"a\":{\"b\":2}}  ").unwrap();
        assert_eq!(parsed.stage, Stage::Whole);
    }

    #[test]
    fn test_failure_keeps_raw_text() {
        let failure = Pipeline::bare().run("I cannot help with that.").unwrap_err();
        assert_eq!(failure.raw, "I cannot help with that.");
        assert_eq!(failure.reason, FailureReason::NoJson);
        assert_eq!(failure.stage, Some(Stage::Embedded));
    }

    #[test]
    fn test_tag_name_is_escaped() {
        let tags = TagPair::new("A.B");
        assert_eq!(tags.strip_blocks("x<AxB>1</AxB>y"), "x<AxB>1</AxB>y");
        assert_eq!(tags.strip_blocks("x<A.B>1</A.B>y"), "xy");
    }
}
