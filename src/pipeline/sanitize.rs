//! Response sanitising: recover a JSON object from conversational model text.
//!
//! Models are told to answer with bare JSON, yet they sometimes wrap it in a
//! ` ```json ` fence or surround it with a sentence of commentary. Two cheap,
//! deterministic rules undo that before parsing:
//!
//! 1. Strip an outer code fence (optionally tagged `json`).
//! 2. Keep the span from the first `{` to the last `}`.
//!
//! ## Known limitation
//!
//! Rule 2 is a scrape, not a tokenizer. It does not balance braces, so text
//! with a `}` inside a string value followed by trailing prose that itself
//! contains braces can select the wrong span. Such input simply fails to
//! parse, which the caller already handles via the retry; a real tokenizer
//! would change which malformed responses are accepted.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sanitise raw model text into a JSON candidate.
///
/// Never fails: when no `{…}` span exists the trimmed (fence-stripped) text
/// is returned as-is and the subsequent parse reports the problem.
pub fn sanitize(raw: &str) -> String {
    let text = strip_code_fences(raw.trim());
    match extract_json_object(&text) {
        Some(candidate) => candidate.to_string(),
        None => text,
    }
}

/// Sanitise and parse in one step.
pub fn parse_candidate(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(&sanitize(raw))
}

// ── Rule 1: Strip code fences ─────────────────────────────────────────────────

static RE_OPENING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^```(?:json)?").unwrap());
static RE_CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```$").unwrap());

/// Remove an opening ```` ``` ```` / ```` ```json ```` marker and a trailing
/// ```` ``` ````. Text that does not start with a fence is only trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }
    let without_open = RE_OPENING_FENCE.replace(text, "");
    let without_close = RE_CLOSING_FENCE.replace(&without_open, "");
    without_close.trim().to_string()
}

// ── Rule 2: First `{` to last `}` ─────────────────────────────────────────────

/// The inclusive span between the first `{` and the last `}`, if the last
/// comes after the first.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
