//! Shape validation: parsed JSON → typed [`Artifact`] or a list of violations.
//!
//! The check is structural only. It never looks at whether an answer is
//! right, whether `answerIndex` points at the semantically correct choice, or
//! whether strings are empty. Fields not named in the schema are ignored on
//! every object, so a model that adds `"explanation"` to each card still
//! passes.
//!
//! Validation walks the whole payload and reports every violation it finds
//! (path + message) instead of stopping at the first, which makes the log
//! line for a rejected response actually useful.

use crate::artifact::{
    Artifact, ArtifactKind, Flashcard, FlashcardSet, QuizQuestion, QuizSet, CHOICE_COUNT,
    SET_SIZE,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One structural problem in a model payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON path of the offending value, e.g. `questions[3].answerIndex`.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate `value` against the shape implied by `kind`.
pub fn validate(value: &Value, kind: ArtifactKind) -> Result<Artifact, Vec<Violation>> {
    match kind {
        ArtifactKind::Flashcards => validate_flashcards(value).map(Artifact::Flashcards),
        ArtifactKind::Quiz => validate_quiz(value).map(Artifact::Quiz),
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(value: &Value, kind: ArtifactKind) -> bool {
    validate(value, kind).is_ok()
}

// ── Flashcards ───────────────────────────────────────────────────────────────

fn validate_flashcards(value: &Value) -> Result<FlashcardSet, Vec<Violation>> {
    let mut violations = Vec::new();
    let items = items_of(value, "flashcards", &mut violations);

    let mut flashcards = Vec::with_capacity(SET_SIZE);
    for (i, item) in items.iter().enumerate() {
        let path = format!("flashcards[{i}]");
        let Some(obj) = as_object(item, &path, &mut violations) else {
            continue;
        };
        let question = string_field(obj, "question", &path, &mut violations);
        let answer = string_field(obj, "answer", &path, &mut violations);
        if let (Some(question), Some(answer)) = (question, answer) {
            flashcards.push(Flashcard { question, answer });
        }
    }

    if violations.is_empty() {
        Ok(FlashcardSet { flashcards })
    } else {
        Err(violations)
    }
}

// ── Quiz ─────────────────────────────────────────────────────────────────────

fn validate_quiz(value: &Value) -> Result<QuizSet, Vec<Violation>> {
    let mut violations = Vec::new();
    let items = items_of(value, "questions", &mut violations);

    let mut questions = Vec::with_capacity(SET_SIZE);
    for (i, item) in items.iter().enumerate() {
        let path = format!("questions[{i}]");
        let Some(obj) = as_object(item, &path, &mut violations) else {
            continue;
        };
        let question = string_field(obj, "question", &path, &mut violations);
        let choices = choices_field(obj, &path, &mut violations);
        let answer_index = answer_index_field(obj, &path, &mut violations);
        if let (Some(question), Some(choices), Some(answer_index)) =
            (question, choices, answer_index)
        {
            questions.push(QuizQuestion {
                question,
                choices,
                answer_index,
            });
        }
    }

    if violations.is_empty() {
        Ok(QuizSet { questions })
    } else {
        Err(violations)
    }
}

fn choices_field(
    obj: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<String>> {
    let field_path = format!("{path}.choices");
    let Some(choices) = obj.get("choices").and_then(Value::as_array) else {
        violations.push(Violation::new(field_path, "expected an array"));
        return None;
    };
    if choices.len() != CHOICE_COUNT {
        violations.push(Violation::new(
            &field_path,
            format!("expected {CHOICE_COUNT} items, got {}", choices.len()),
        ));
    }
    let mut out = Vec::with_capacity(choices.len());
    for (j, choice) in choices.iter().enumerate() {
        match choice.as_str() {
            Some(s) => out.push(s.to_string()),
            None => violations.push(Violation::new(
                format!("{field_path}[{j}]"),
                "expected a string",
            )),
        }
    }
    (out.len() == CHOICE_COUNT).then_some(out)
}

/// `answerIndex` must be an integer in `0..CHOICE_COUNT`. Integral floats such
/// as `2.0` are accepted, matching how JSON numbers are usually compared.
fn answer_index_field(
    obj: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<u8> {
    let field_path = format!("{path}.answerIndex");
    let index = match obj.get("answerIndex") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    };
    match index {
        Some(i) if (0..CHOICE_COUNT as i64).contains(&i) => Some(i as u8),
        Some(i) => {
            violations.push(Violation::new(
                field_path,
                format!("must be in 0..={}, got {i}", CHOICE_COUNT - 1),
            ));
            None
        }
        None => {
            violations.push(Violation::new(field_path, "expected an integer"));
            None
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// The item array under `field`, checking it holds exactly [`SET_SIZE`] items.
///
/// Returns the items even when the count is wrong so the per-item checks can
/// still report.
fn items_of<'a>(value: &'a Value, field: &str, violations: &mut Vec<Violation>) -> &'a [Value] {
    let Some(items) = value.get(field).and_then(Value::as_array) else {
        violations.push(Violation::new(field, "expected an array"));
        return &[];
    };
    if items.len() != SET_SIZE {
        violations.push(Violation::new(
            field,
            format!("expected {SET_SIZE} items, got {}", items.len()),
        ));
    }
    items
}

fn as_object<'a>(
    item: &'a Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Map<String, Value>> {
    let obj = item.as_object();
    if obj.is_none() {
        violations.push(Violation::new(path, "expected an object"));
    }
    obj
}

fn string_field(
    obj: &Map<String, Value>,
    field: &str,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match obj.get(field).and_then(Value::as_str) {
        Some(s) => Some(s.to_string()),
        None => {
            violations.push(Violation::new(
                format!("{path}.{field}"),
                "expected a string",
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flashcards(n: usize) -> Value {
        let cards: Vec<Value> = (0..n)
            .map(|i| json!({ "question": format!("Q{i}"), "answer": format!("A{i}") }))
            .collect();
        json!({ "flashcards": cards })
    }

    fn quiz_with_index(index: Value) -> Value {
        let questions: Vec<Value> = (0..SET_SIZE)
            .map(|i| {
                json!({
                    "question": format!("Q{i}"),
                    "choices": ["a", "b", "c", "d"],
                    "answerIndex": index.clone(),
                })
            })
            .collect();
        json!({ "questions": questions })
    }

    #[test]
    fn flashcards_need_exactly_ten() {
        assert!(validate(&flashcards(9), ArtifactKind::Flashcards).is_err());
        assert!(validate(&flashcards(11), ArtifactKind::Flashcards).is_err());
        let artifact = validate(&flashcards(10), ArtifactKind::Flashcards).unwrap();
        assert_eq!(artifact.len(), 10);
    }

    #[test]
    fn flashcards_count_violation_has_path() {
        let err = validate(&flashcards(9), ArtifactKind::Flashcards).unwrap_err();
        assert_eq!(err, vec![Violation::new("flashcards", "expected 10 items, got 9")]);
    }

    #[test]
    fn flashcards_extra_fields_ignored() {
        let mut value = flashcards(10);
        value["flashcards"][0]["hint"] = json!("extra");
        value["topic"] = json!("biology");
        assert!(is_valid(&value, ArtifactKind::Flashcards));
    }

    #[test]
    fn flashcards_reject_non_string_answer() {
        let mut value = flashcards(10);
        value["flashcards"][4]["answer"] = json!(42);
        let err = validate(&value, ArtifactKind::Flashcards).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].path, "flashcards[4].answer");
    }

    #[test]
    fn empty_strings_are_structurally_valid() {
        let mut value = flashcards(10);
        value["flashcards"][0]["question"] = json!("");
        assert!(is_valid(&value, ArtifactKind::Flashcards));
    }

    #[test]
    fn missing_field_or_wrong_type() {
        assert!(!is_valid(&json!({}), ArtifactKind::Flashcards));
        assert!(!is_valid(&json!({ "flashcards": "ten" }), ArtifactKind::Flashcards));
        assert!(!is_valid(&json!([1, 2, 3]), ArtifactKind::Quiz));
    }

    #[test]
    fn flashcards_payload_is_not_a_quiz() {
        assert!(!is_valid(&flashcards(10), ArtifactKind::Quiz));
    }

    #[test]
    fn quiz_answer_index_range() {
        for i in 0..=3 {
            assert!(is_valid(&quiz_with_index(json!(i)), ArtifactKind::Quiz), "index {i}");
        }
        assert!(!is_valid(&quiz_with_index(json!(4)), ArtifactKind::Quiz));
        assert!(!is_valid(&quiz_with_index(json!(-1)), ArtifactKind::Quiz));
    }

    #[test]
    fn quiz_answer_index_must_be_integer() {
        assert!(!is_valid(&quiz_with_index(json!(1.5)), ArtifactKind::Quiz));
        assert!(!is_valid(&quiz_with_index(json!("1")), ArtifactKind::Quiz));
        assert!(!is_valid(&quiz_with_index(Value::Null), ArtifactKind::Quiz));
        assert!(is_valid(&quiz_with_index(json!(2.0)), ArtifactKind::Quiz));
    }

    #[test]
    fn quiz_needs_four_string_choices() {
        let mut value = quiz_with_index(json!(0));
        value["questions"][2]["choices"] = json!(["a", "b", "c"]);
        let err = validate(&value, ArtifactKind::Quiz).unwrap_err();
        assert_eq!(err[0].path, "questions[2].choices");

        let mut value = quiz_with_index(json!(0));
        value["questions"][7]["choices"] = json!(["a", "b", 3, "d"]);
        let err = validate(&value, ArtifactKind::Quiz).unwrap_err();
        assert_eq!(err[0].path, "questions[7].choices[2]");
    }

    #[test]
    fn quiz_typed_result() {
        let artifact = validate(&quiz_with_index(json!(3)), ArtifactKind::Quiz).unwrap();
        match artifact {
            Artifact::Quiz(set) => {
                assert_eq!(set.questions.len(), 10);
                assert_eq!(set.questions[0].answer_index, 3);
                assert_eq!(set.questions[0].correct_choice(), Some("d"));
            }
            other => panic!("expected quiz, got {other:?}"),
        }
    }

    #[test]
    fn reports_every_violation() {
        let mut value = quiz_with_index(json!(9));
        value["questions"][0]["question"] = json!(null);
        let err = validate(&value, ArtifactKind::Quiz).unwrap_err();
        // one bad question text + ten bad indices
        assert_eq!(err.len(), 11);
    }
}
