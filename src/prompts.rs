//! Prompts for flashcard and quiz generation.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect the prompts without calling a model. The system
//! prompts state the full JSON schema and its hard limits; enforcement of
//! those limits happens downstream in [`crate::pipeline::validate`], never
//! here.

use crate::artifact::ArtifactKind;

/// System prompt for flashcard generation.
pub const FLASHCARDS_SYSTEM_PROMPT: &str = r#"You are a flashcard generator. Always return STRICT JSON with this schema:
{
  "flashcards": [
    { "question": "string", "answer": "string" }
  ]
}
Rules:
- Exactly 10 flashcards.
- No markdown, no backticks, no commentary.
- Plain JSON only."#;

/// System prompt for multiple-choice quiz generation.
pub const QUIZ_SYSTEM_PROMPT: &str = r#"You are a quiz generator. Always return STRICT JSON with this schema:
{
  "questions": [
    { "question": "string", "choices": ["A","B","C","D"], "answerIndex": 0 }
  ]
}
Rules:
- Exactly 10 multiple-choice questions.
- Each "choices" array must have exactly 4 options.
- "answerIndex" is 0..3 and matches the correct choice.
- No markdown, no backticks, no commentary.
- Plain JSON only."#;

/// System prompt for the single JSON-repair retry.
///
/// Deliberately does not restate the schema: the user prompt is resent
/// unchanged and the retry only tightens the output format.
pub const STRICT_RETRY_SYSTEM_PROMPT: &str =
    "Return ONLY valid JSON. No prose. No markdown. Follow the schema exactly.";

/// A system/user instruction pair for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Same user prompt, stricter system instruction.
    pub fn strict_retry(&self) -> PromptPair {
        PromptPair {
            system: STRICT_RETRY_SYSTEM_PROMPT.to_string(),
            user: self.user.clone(),
        }
    }
}

/// System prompt for the given kind.
pub fn system_prompt(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Flashcards => FLASHCARDS_SYSTEM_PROMPT,
        ArtifactKind::Quiz => QUIZ_SYSTEM_PROMPT,
    }
}

/// User prompt embedding the (already truncated) source text.
pub fn user_prompt(kind: ArtifactKind, text: &str) -> String {
    match kind {
        ArtifactKind::Flashcards => {
            format!("Create 10 flashcards from the content:\n\n{text}")
        }
        ArtifactKind::Quiz => format!(
            "Create 10 MCQs from the content with 4 options each. Return only JSON:\n\n{text}"
        ),
    }
}

/// Build the prompt pair for a generation request.
pub fn build_prompts(kind: ArtifactKind, text: &str) -> PromptPair {
    PromptPair {
        system: system_prompt(kind).to_string(),
        user: user_prompt(kind, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashcard_prompts() {
        let p = build_prompts(ArtifactKind::Flashcards, "Mitochondria make ATP.");
        assert!(p.system.contains("\"flashcards\""));
        assert!(p.system.contains("Exactly 10 flashcards"));
        assert!(p.user.starts_with("Create 10 flashcards"));
        assert!(p.user.ends_with("Mitochondria make ATP."));
    }

    #[test]
    fn quiz_prompts_state_hard_limits() {
        let p = build_prompts(ArtifactKind::Quiz, "text");
        assert!(p.system.contains("exactly 4 options"));
        assert!(p.system.contains("0..3"));
        assert!(p.system.contains("No markdown"));
        assert!(p.user.contains("4 options each"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            build_prompts(ArtifactKind::Quiz, "abc"),
            build_prompts(ArtifactKind::Quiz, "abc")
        );
    }

    #[test]
    fn strict_retry_keeps_user_prompt() {
        let p = build_prompts(ArtifactKind::Flashcards, "some content");
        let retry = p.strict_retry();
        assert_eq!(retry.user, p.user);
        assert_eq!(retry.system, STRICT_RETRY_SYSTEM_PROMPT);
        assert!(!retry.system.contains("flashcards"));
    }
}
