//! Generated artifacts: flashcard sets and multiple-choice quizzes.
//!
//! These records are the typed result of a successful
//! [`crate::pipeline::validate::validate`] call. Their serde representation is
//! exactly the JSON schema the model is asked to produce, so a validated
//! artifact serialises back to the same shape the caller of `POST /generate`
//! receives under `"result"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of items in every generated set.
pub const SET_SIZE: usize = 10;

/// Number of choices in every quiz question.
pub const CHOICE_COUNT: usize = 4;

/// Which artifact a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Question/answer cards.
    Flashcards,
    /// Multiple-choice questions with four options each.
    #[default]
    Quiz,
}

impl ArtifactKind {
    /// Interpret the free-form `type` selector of the form boundary.
    ///
    /// Only the literal `"flashcards"` selects flashcards; every other value,
    /// including a missing one, selects the quiz.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            Some("flashcards") => ArtifactKind::Flashcards,
            _ => ArtifactKind::Quiz,
        }
    }

    /// Top-level JSON field holding the items for this kind.
    pub fn payload_field(self) -> &'static str {
        match self {
            ArtifactKind::Flashcards => "flashcards",
            ArtifactKind::Quiz => "questions",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Flashcards => f.write_str("flashcards"),
            ArtifactKind::Quiz => f.write_str("quiz"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    /// Strict parse used by the CLI; accepts `flashcards`, `quiz` and `questions`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flashcards" | "flashcard" => Ok(ArtifactKind::Flashcards),
            "quiz" | "questions" | "mcq" => Ok(ArtifactKind::Quiz),
            other => Err(format!(
                "unknown artifact kind '{other}' (expected 'flashcards' or 'quiz')"
            )),
        }
    }
}

/// A single question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Exactly [`SET_SIZE`] flashcards, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub flashcards: Vec<Flashcard>,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// Exactly [`CHOICE_COUNT`] options.
    pub choices: Vec<String>,
    /// Index into `choices`, in `0..CHOICE_COUNT`.
    #[serde(rename = "answerIndex")]
    pub answer_index: u8,
}

impl QuizQuestion {
    /// The choice the model marked as correct.
    pub fn correct_choice(&self) -> Option<&str> {
        self.choices.get(self.answer_index as usize).map(String::as_str)
    }
}

/// Exactly [`SET_SIZE`] quiz questions, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSet {
    pub questions: Vec<QuizQuestion>,
}

/// A validated generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Artifact {
    Flashcards(FlashcardSet),
    Quiz(QuizSet),
}

impl Artifact {
    /// The kind this artifact satisfies.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Flashcards(_) => ArtifactKind::Flashcards,
            Artifact::Quiz(_) => ArtifactKind::Quiz,
        }
    }

    /// Number of generated items.
    pub fn len(&self) -> usize {
        match self {
            Artifact::Flashcards(set) => set.flashcards.len(),
            Artifact::Quiz(set) => set.questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_defaults_to_quiz() {
        assert_eq!(
            ArtifactKind::from_selector(Some("flashcards")),
            ArtifactKind::Flashcards
        );
        assert_eq!(ArtifactKind::from_selector(Some("quiz")), ArtifactKind::Quiz);
        assert_eq!(ArtifactKind::from_selector(Some("Flashcards")), ArtifactKind::Quiz);
        assert_eq!(ArtifactKind::from_selector(None), ArtifactKind::Quiz);
    }

    #[test]
    fn strict_parse() {
        assert_eq!("Quiz".parse::<ArtifactKind>(), Ok(ArtifactKind::Quiz));
        assert_eq!(
            " flashcards ".parse::<ArtifactKind>(),
            Ok(ArtifactKind::Flashcards)
        );
        assert!("poems".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn quiz_question_uses_camel_case_index() {
        let q = QuizQuestion {
            question: "2 + 2?".into(),
            choices: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            answer_index: 1,
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["answerIndex"], 1);
        assert_eq!(q.correct_choice(), Some("4"));
    }

    #[test]
    fn artifact_serialises_without_tag() {
        let artifact = Artifact::Flashcards(FlashcardSet {
            flashcards: vec![Flashcard {
                question: "Q".into(),
                answer: "A".into(),
            }],
        });
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["flashcards"][0]["answer"], "A");
        assert_eq!(artifact.kind(), ArtifactKind::Flashcards);
        assert_eq!(artifact.len(), 1);
    }
}
