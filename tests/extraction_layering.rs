//! Structured-output extraction over realistic generator replies

use serde_json::json;

use lectern::extract::{
    extract, extract_as, extract_hybrid, extract_json, FailureReason, Hybrid, Pipeline, QuizSet,
    Rubric, SchemaKind, Stage, Structured, RUBRIC_TAG,
};

#[test]
fn test_bare_object() {
    let parsed = extract_json(r#"{"a":1}"#, &Pipeline::bare()).unwrap();
    assert_eq!(parsed.value, json!({"a": 1}));
    assert_eq!(parsed.stage, Stage::Whole);
}

#[test]
fn test_tagged_and_fenced_rubric_keeps_trailing_prose() {
    let raw = "<RUBRIC_JSON>```json\n{\"title\":\"T\",\"items\":[{\"criterion\":\"Lead\",\"weight\":100,\"description\":\"Strong opening\"}]}\n```</RUBRIC_JSON>\nDone.";

    let extracted = extract_as::<Rubric>(raw).unwrap();
    assert_eq!(extracted.stage, Stage::Tagged);
    assert_eq!(extracted.data.title, "T");
    assert_eq!(extracted.data.items[0].criterion, "Lead");
    assert_eq!(extracted.residual.as_deref(), Some("Done."));

    let hybrid: Hybrid<Rubric> = extract_hybrid(raw, "unused");
    assert_eq!(hybrid.message, "Done.");
    assert!(hybrid.data.is_some());
}

#[test]
fn test_object_embedded_in_prose() {
    let raw = "Sure! Here is your quiz:\n{\"questions\":[{\"id\":1,\"stem\":\"Who coined 'gatekeeping'?\",\"options\":[\"Lewin\",\"White\"],\"answer\":\"A\",\"analysis\":\"Kurt Lewin, 1947\"}]}\nGood luck.";

    let extracted = extract_as::<QuizSet>(raw).unwrap();
    assert_eq!(extracted.stage, Stage::Embedded);
    let question = &extracted.data.questions[0];
    assert_eq!(question.question_type, "single_choice");
    assert_eq!(question.difficulty, "medium");
    assert_eq!(question.options.len(), 2);
}

#[test]
fn test_fenced_quiz_parses_whole() {
    let raw = "```json\n{\"questions\":[]}\n```";
    let extracted = extract_as::<QuizSet>(raw).unwrap();
    assert_eq!(extracted.stage, Stage::Whole);
    assert!(extracted.data.questions.is_empty());
}

#[test]
fn test_no_braces_fails_with_raw_text() {
    let raw = "I'm sorry, I can't produce a quiz on that topic.";
    let failure = extract(raw, SchemaKind::Quiz).unwrap_err();
    assert_eq!(failure.reason, FailureReason::NoJson);
    assert_eq!(failure.raw, raw);
}

#[test]
fn test_malformed_everywhere_is_malformed() {
    let failure = extract_json("{\"questions\": [1, 2,}", &Pipeline::bare()).unwrap_err();
    assert!(matches!(failure.reason, FailureReason::Malformed(_)));
    assert_eq!(failure.stage, Some(Stage::Embedded));
}

#[test]
fn test_grading_outcome_accepts_comment_details() {
    let raw = r#"{"student_name":"Unknown","total_score":0,"feedback":"Clear thesis","details":{"Thesis":"Focused","Evidence":"Thin"}}"#;
    match extract(raw, SchemaKind::Grading).unwrap().data {
        Structured::Grading(outcome) => {
            assert_eq!(outcome.details.len(), 2);
            assert_eq!(outcome.total_score, 0.0);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_grading_outcome_rejects_nested_details() {
    let raw = r#"{"student_name":"A","total_score":80,"feedback":"ok","details":{"Lead":{"score":20}}}"#;
    let failure = extract(raw, SchemaKind::Grading).unwrap_err();
    assert!(matches!(failure.reason, FailureReason::Schema(_)));
}

#[test]
fn test_custom_tag_pipeline() {
    let pipeline = Pipeline::tagged_then_bare("QUIZ");
    let parsed = extract_json("<QUIZ>{\"questions\":[]}</QUIZ> and more", &pipeline).unwrap();
    assert_eq!(parsed.stage, Stage::Tagged);
    assert_eq!(parsed.residual.as_deref(), Some("and more"));

    // Without tags the bare stages still run
    let parsed = extract_json("{\"questions\":[]}", &pipeline).unwrap();
    assert_eq!(parsed.stage, Stage::Whole);
    assert_ne!(RUBRIC_TAG, "QUIZ");
}
