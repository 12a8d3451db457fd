//! Suggestion records as stored per issue.

use crate::constants::{PREVIEW_MAX_CHARS, STRUCTURED_PREVIEW_FALLBACK};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An AI-generated proposed edit to an issue's summary and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    /// Overwrites the issue's summary when the suggestion is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Short preview for listings.
    #[serde(default)]
    pub description: String,
    /// Full proposed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_description: Option<SuggestionBody>,
    #[serde(alias = "llm")]
    pub source_model: String,
    pub score: Score,
}

/// The full description carried by a suggestion.
///
/// Resolved once when the suggestion is created; the apply flow matches on the variant instead
/// of re-inspecting JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionBody {
    /// Plain text or light markdown, converted on apply.
    RawText(String),
    /// An already structured document, sent on apply as-is.
    Structured(Map<String, Value>),
}

impl SuggestionBody {
    /// Maps an incoming JSON description. Values that are neither strings nor objects are
    /// dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(SuggestionBody::RawText(text.clone())),
            Value::Object(map) => Some(SuggestionBody::Structured(map.clone())),
            _ => None,
        }
    }

    /// Preview text for listings.
    pub fn preview(&self) -> String {
        match self {
            SuggestionBody::RawText(text) => truncate_preview(text),
            SuggestionBody::Structured(map) => {
                adf::first_paragraph_text(&Value::Object(map.clone()))
                    .map(truncate_preview)
                    .unwrap_or_else(|| STRUCTURED_PREVIEW_FALLBACK.to_owned())
            }
        }
    }
}

/// Cuts `text` to [`PREVIEW_MAX_CHARS`] characters, appending `...` when anything was cut.
pub fn truncate_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_MAX_CHARS {
        let mut preview: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        text.to_owned()
    }
}

/// Confidence of a suggestion, either numeric or a percent string such as `"85%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    /// Numeric value of the score.
    ///
    /// Percent strings are read like an integer prefix: `"85%"` and `"85.9%"` give 85, while
    /// strings without leading digits give `None`.
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Number(n) => Some(*n),
            Score::Text(text) => {
                let text = text.replace('%', "");
                let text = text.trim_start();
                let (sign, digits) = match text.strip_prefix('-') {
                    Some(rest) => (-1.0, rest),
                    None => (1.0, text.strip_prefix('+').unwrap_or(text)),
                };
                let end = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                digits[..end]
                    .parse::<i64>()
                    .ok()
                    .map(|n| sign * n as f64)
            }
        }
    }

    /// Reads a score from an incoming payload field.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Score::Number),
            Value::String(text) => Some(Score::Text(text.clone())),
            _ => None,
        }
    }
}
