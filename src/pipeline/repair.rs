//! Heuristic repair of near-miss JSON
//!
//! Each normalization is a pure text transformation that is idempotent and
//! leaves valid JSON objects and arrays untouched. They are applied
//! cumulatively, with a parse attempt after every step.

use super::parse::{ParseStage, ParsedResponse};
use serde_json::Value;

/// Number of characters of the raw model output kept for diagnostics
pub const PREVIEW_CHARS: usize = 500;

/// Every extraction and repair attempt failed
///
/// Carries a bounded preview of the original text and the reason each attempt
/// failed, in order, so a failure can be reproduced offline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Failed to parse model output after {} attempts ({response_length} chars received): {}",
    .reasons.len(),
    .reasons.join("; ")
)]
pub struct UnparsableResponseError {
    preview: String,
    response_length: usize,
    reasons: Vec<String>,
}

impl UnparsableResponseError {
    pub fn new(raw: &str, reasons: Vec<String>) -> Self {
        Self {
            preview: raw.chars().take(PREVIEW_CHARS).collect(),
            response_length: raw.chars().count(),
            reasons,
        }
    }

    /// First `PREVIEW_CHARS` characters of the raw model output
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Length of the raw model output in characters
    pub fn response_length(&self) -> usize {
        self.response_length
    }

    /// Failure reason for every attempt, in the order attempted
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

type Normalization = fn(&str) -> String;

/// Repair steps in the order they are applied
const REPAIR_STEPS: [(ParseStage, Normalization); 4] = [
    (ParseStage::TrailingCommas, strip_trailing_commas),
    (ParseStage::EscapedNewlines, escape_string_newlines),
    (ParseStage::ControlCharacters, strip_control_characters),
    (ParseStage::Retrimmed, retrim),
];

/// Apply the repair steps to `candidate`, parsing after each one
///
/// `raw` is the full model output (used for the diagnostic preview) and
/// `reasons` the failures recorded before repair began.
pub fn repair(
    raw: &str,
    candidate: &str,
    mut reasons: Vec<String>,
) -> Result<ParsedResponse, UnparsableResponseError> {
    let mut current = candidate.to_string();

    for (stage, normalize) in REPAIR_STEPS {
        current = normalize(&current);
        match serde_json::from_str::<Value>(&current) {
            Ok(value) => {
                tracing::debug!(
                    stage = stage.as_str(),
                    prior_failures = reasons.len(),
                    "Model output parsed after repair"
                );
                return Ok(ParsedResponse { value, stage });
            }
            Err(e) => reasons.push(format!("{} parse failed: {}", stage.description(), e)),
        }
    }

    Err(UnparsableResponseError::new(raw, reasons))
}

/// All normalizations applied in order
pub fn normalize(input: &str) -> String {
    REPAIR_STEPS
        .iter()
        .fold(input.to_string(), |text, (_, step)| step(&text))
}

/// Characters that may sit between a trailing comma and its closer
fn is_filler(c: char) -> bool {
    c.is_whitespace() || c.is_control() || c == '\u{feff}' || c == ','
}

/// Tracks whether a character-by-character scan is inside a string literal
#[derive(Default)]
struct StringState {
    in_string: bool,
    escaped: bool,
}

/// Remove commas (outside strings) that are followed only by filler and then
/// `}` or `]`
pub fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut state = StringState::default();

    for (i, &c) in chars.iter().enumerate() {
        if state.in_string {
            if state.escaped {
                state.escaped = false;
            } else if c == '\\' {
                state.escaped = true;
            } else if c == '"' {
                state.in_string = false;
            }
            out.push(c);
            continue;
        }

        if c == '"' {
            state.in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|&&n| !is_filler(n));
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

/// Escape raw newline, carriage return and tab characters inside strings
///
/// A backslash directly followed by a raw newline becomes the `\n` escape.
pub fn escape_string_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = StringState::default();

    for c in input.chars() {
        if !state.in_string {
            if c == '"' {
                state.in_string = true;
            }
            out.push(c);
            continue;
        }

        let letter = match c {
            '\n' => Some('n'),
            '\r' => Some('r'),
            '\t' => Some('t'),
            _ => None,
        };

        match letter {
            Some(letter) => {
                if !state.escaped {
                    out.push('\\');
                }
                out.push(letter);
                state.escaped = false;
            }
            None => {
                if state.escaped {
                    state.escaped = false;
                } else if c == '\\' {
                    state.escaped = true;
                } else if c == '"' {
                    state.in_string = false;
                }
                out.push(c);
            }
        }
    }

    out
}

/// Drop non-printable control characters
///
/// Inside strings every U+0000..U+001F character is invalid and removed
/// (together with a backslash escaping it). Outside strings JSON whitespace is
/// kept and other controls, DEL and byte-order marks are removed.
pub fn strip_control_characters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = StringState::default();

    for c in input.chars() {
        if state.in_string {
            if c <= '\u{1f}' {
                if state.escaped {
                    out.pop();
                    state.escaped = false;
                }
                continue;
            }
            if state.escaped {
                state.escaped = false;
            } else if c == '\\' {
                state.escaped = true;
            } else if c == '"' {
                state.in_string = false;
            }
            out.push(c);
            continue;
        }

        match c {
            ' ' | '\n' | '\r' | '\t' => out.push(c),
            '"' => {
                state.in_string = true;
                out.push(c);
            }
            c if c.is_control() || c == '\u{feff}' => {}
            _ => out.push(c),
        }
    }

    out
}

/// Cut anything before the first `{`/`[` and after the last matching closer
///
/// Text without an opener is only whitespace-trimmed. When no closer follows
/// the opener (truncated output) the tail is kept as-is.
pub fn retrim(input: &str) -> String {
    let text = input.trim();
    let Some(start) = text.find(['{', '[']) else {
        return text.to_string();
    };

    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let body = &text[start..];
    match body.rfind(closer) {
        Some(end) => body[..=end].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_trailing_comma_object() {
        assert_eq!(strip_trailing_commas(r#"{"a":1,}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_trailing_comma_array_with_whitespace() {
        assert_eq!(strip_trailing_commas("[1, 2,\n  ]"), "[1, 2\n  ]");
    }

    #[test]
    fn test_trailing_comma_run_is_removed_in_one_pass() {
        let once = strip_trailing_commas(r#"{"a":1,, }"#);
        assert_eq!(once, r#"{"a":1 }"#);
        assert_eq!(strip_trailing_commas(&once), once);
    }

    #[test]
    fn test_trailing_comma_inside_string_is_kept() {
        let text = r#"{"a":"x,}","b":[",]"]}"#;
        assert_eq!(strip_trailing_commas(text), text);
    }

    #[test]
    fn test_escape_newline_inside_string() {
        let text = "{\"a\":\"line one\nline two\"}";
        let fixed = escape_string_newlines(text);
        assert_eq!(fixed, "{\"a\":\"line one\\nline two\"}");
        assert_eq!(parse(&fixed)["a"], "line one\nline two");
    }

    #[test]
    fn test_newline_between_tokens_is_kept() {
        let text = "{\n  \"a\": 1\n}";
        assert_eq!(escape_string_newlines(text), text);
    }

    #[test]
    fn test_escaped_backslash_before_newline() {
        // `\\` is a complete escape, so the newline after it is raw and needs escaping
        let text = "{\"a\":\"x\\\\\ny\"}";
        let fixed = escape_string_newlines(text);
        assert_eq!(parse(&fixed)["a"], "x\\\ny");
    }

    #[test]
    fn test_backslash_newline_becomes_escape() {
        let fixed = escape_string_newlines("{\"a\":\"x\\\ny\"}");
        assert_eq!(fixed, "{\"a\":\"x\\ny\"}");
    }

    #[test]
    fn test_control_characters_removed() {
        let text = "{\"a\":\"b\u{0}c\u{1b}\"}\u{7f}";
        assert_eq!(strip_control_characters(text), "{\"a\":\"bc\"}");
    }

    #[test]
    fn test_control_characters_keep_whitespace_outside_strings() {
        let text = "{\n\t\"a\": 1\r\n}";
        assert_eq!(strip_control_characters(text), text);
    }

    #[test]
    fn test_escaped_control_character_drops_backslash() {
        let text = "{\"a\":\"x\\\u{1}\"}";
        let fixed = strip_control_characters(text);
        assert_eq!(fixed, "{\"a\":\"x\"}");
        assert_eq!(strip_control_characters(&fixed), fixed);
    }

    #[test]
    fn test_byte_order_mark_removed() {
        assert_eq!(strip_control_characters("\u{feff}{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_retrim_cuts_prose() {
        assert_eq!(retrim("Here you go: {\"a\":1} hope it helps"), "{\"a\":1}");
        assert_eq!(retrim("list: [1,2] end"), "[1,2]");
    }

    #[test]
    fn test_retrim_keeps_truncated_tail() {
        assert_eq!(retrim("ok {\"a\": [1, 2"), "{\"a\": [1, 2");
    }

    #[test]
    fn test_retrim_without_opener() {
        assert_eq!(retrim("  nothing here  "), "nothing here");
    }

    #[test]
    fn test_normalize_leaves_valid_json_unchanged() {
        let text = r#"{"days":[{"day":1,"places":[{"name":"Fort, old","timing":"9am-11am"}]}],"tips":["a\nb"]}"#;
        assert_eq!(normalize(text), text);
        assert_eq!(normalize(&normalize(text)), normalize(text));
    }

    #[test]
    fn test_repair_reports_stage() {
        let parsed = repair("{\"a\":1,}", "{\"a\":1,}", Vec::new()).unwrap();
        assert_eq!(parsed.stage, ParseStage::TrailingCommas);
        assert_eq!(parsed.value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_repair_combines_steps() {
        let broken = "{\"tip\":\"bring\nwater\",\"list\":[1,2,],}";
        let parsed = repair(broken, broken, Vec::new()).unwrap();
        assert_eq!(parsed.stage, ParseStage::EscapedNewlines);
        assert_eq!(parsed.value["tip"], "bring\nwater");
        assert_eq!(parsed.value["list"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_repair_exhaustion_keeps_all_reasons() {
        let err = repair("nope", "nope", vec!["earlier".to_string()]).unwrap_err();
        assert_eq!(err.reasons().len(), 5);
        assert_eq!(err.reasons()[0], "earlier");
        assert!(err.reasons()[4].starts_with("Boundary re-trim"));
    }

    #[test]
    fn test_preview_is_bounded_by_characters() {
        let raw = "ü".repeat(PREVIEW_CHARS + 20);
        let err = UnparsableResponseError::new(&raw, vec!["x".to_string()]);
        assert_eq!(err.preview().chars().count(), PREVIEW_CHARS);
        assert_eq!(err.response_length(), PREVIEW_CHARS + 20);
    }
}
