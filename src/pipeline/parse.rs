//! Turn raw model output into a JSON value
//!
//! Attempts, in order: direct parse, extraction, then the repair steps on the
//! extracted candidate (or on the whole text when nothing was extracted).

use super::extract::extract_json;
use super::repair::{UnparsableResponseError, repair};
use serde_json::Value;

/// The attempt that produced a parseable value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Direct,
    Extracted,
    TrailingCommas,
    EscapedNewlines,
    ControlCharacters,
    Retrimmed,
}

impl ParseStage {
    /// Label used for metrics and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStage::Direct => "direct",
            ParseStage::Extracted => "extracted",
            ParseStage::TrailingCommas => "trailing_commas",
            ParseStage::EscapedNewlines => "escaped_newlines",
            ParseStage::ControlCharacters => "control_characters",
            ParseStage::Retrimmed => "retrimmed",
        }
    }

    /// Human-readable name used in failure reasons
    pub fn description(&self) -> &'static str {
        match self {
            ParseStage::Direct => "Direct",
            ParseStage::Extracted => "Extracted JSON",
            ParseStage::TrailingCommas => "Trailing comma removal",
            ParseStage::EscapedNewlines => "Newline escaping",
            ParseStage::ControlCharacters => "Control character removal",
            ParseStage::Retrimmed => "Boundary re-trim",
        }
    }

    /// True if a repair heuristic was needed
    pub fn was_repaired(&self) -> bool {
        !matches!(self, ParseStage::Direct | ParseStage::Extracted)
    }
}

/// A parsed value and the stage that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub value: Value,
    pub stage: ParseStage,
}

/// Parse raw model output, extracting and repairing as needed
pub fn parse_model_output(raw: &str) -> Result<ParsedResponse, UnparsableResponseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UnparsableResponseError::new(
            raw,
            vec!["Empty response from model".to_string()],
        ));
    }

    let mut reasons = Vec::new();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            return Ok(ParsedResponse {
                value,
                stage: ParseStage::Direct,
            });
        }
        Err(e) => reasons.push(format!("{} parse failed: {}", ParseStage::Direct.description(), e)),
    }

    let candidate = match extract_json(trimmed) {
        Some(extracted) => match serde_json::from_str::<Value>(extracted) {
            Ok(value) => {
                return Ok(ParsedResponse {
                    value,
                    stage: ParseStage::Extracted,
                });
            }
            Err(e) => {
                reasons.push(format!(
                    "{} parse failed: {}",
                    ParseStage::Extracted.description(),
                    e
                ));
                extracted
            }
        },
        None => {
            reasons.push("No JSON structure found in response".to_string());
            trimmed
        }
    };

    repair(raw, candidate, reasons)
}
