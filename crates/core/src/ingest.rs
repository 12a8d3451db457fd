//! Webhook payload normalisation.
//!
//! The automation workflow posting suggestions is not consistent about framing. The same
//! payload may arrive as:
//! - a plain object `{ "key": "GS-64", "suggestions": [...] }`
//! - a one-element array wrapping it
//! - an object whose `output` field is the payload serialised again as a JSON string
//! - an object whose `body` field holds the payload
//!
//! [`parse_body`] and [`unwrap_payload`] reduce all of these to the payload object, and
//! [`build_suggestions`] turns it into the records stored for the issue.

use crate::constants::{DEFAULT_MODEL_LABEL, DEFAULT_SCORE, DEFAULT_SUGGESTION_TITLE, LEGACY_MODEL_LABEL};
use crate::error::{SuggestionError, SuggestionResult};
use crate::suggestion::{truncate_preview, Score, Suggestion, SuggestionBody};
use drjira_types::IssueKey;
use serde_json::{Map, Value};

/// Suggestions extracted from one webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedSuggestions {
    pub issue_key: IssueKey,
    pub suggestions: Vec<Suggestion>,
}

/// Parses a raw request body.
///
/// A body that decodes to a JSON string is decoded once more, covering senders that serialise
/// the payload before handing it to an HTTP client that serialises again.
///
/// # Errors
///
/// Returns `SuggestionError::InvalidJson` if the body is not valid JSON.
pub fn parse_body(raw: &str) -> SuggestionResult<Value> {
    let payload: Value = serde_json::from_str(raw).map_err(SuggestionError::InvalidJson)?;
    match payload {
        Value::String(inner) => serde_json::from_str(&inner).map_err(SuggestionError::InvalidJson),
        other => Ok(other),
    }
}

/// Reduces the framing variants described in the module docs to the payload object.
pub fn unwrap_payload(payload: Value) -> Value {
    let item = match payload {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };

    if let Some(output) = item.get("output").and_then(Value::as_str) {
        return match serde_json::from_str::<Value>(output) {
            Ok(inner) => inner,
            Err(e) => {
                tracing::error!("failed to parse inner output JSON, using item as-is: {}", e);
                item
            }
        };
    }

    if let Some(body) = item.get("body").filter(|body| body.is_object()) {
        tracing::debug!("using nested body object as payload root");
        return body.clone();
    }

    if item.is_null() {
        Value::Object(Map::new())
    } else {
        item
    }
}

/// Builds the suggestion records for a normalised payload.
///
/// `now_millis` seeds suggestion ids: `"{now_millis}-{index}"` for the array format and
/// `"{now_millis}"` for the legacy single-description format.
///
/// # Errors
///
/// Returns:
/// - `SuggestionError::MissingIssueKey` if `key` is absent or empty,
/// - `SuggestionError::InvalidIssueKey` if `key` contains characters outside `[A-Za-z0-9_-]`,
/// - `SuggestionError::MissingSuggestionContent` if neither a `suggestions` array nor a
///   legacy `description` is present.
pub fn build_suggestions(data: &Value, now_millis: i64) -> SuggestionResult<IngestedSuggestions> {
    let issue_key = issue_key_field(data).ok_or(SuggestionError::MissingIssueKey)?;
    let issue_key = IssueKey::new(issue_key)?;

    let suggestions = if let Some(items) = data.get("suggestions").and_then(Value::as_array) {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| suggestion_from_item(item, format!("{now_millis}-{index}")))
            .collect()
    } else if let Some(description) = data.get("description").filter(|d| is_truthy(d)) {
        vec![legacy_suggestion(data, description, now_millis.to_string())]
    } else {
        return Err(SuggestionError::MissingSuggestionContent);
    };

    Ok(IngestedSuggestions {
        issue_key,
        suggestions,
    })
}

fn issue_key_field(data: &Value) -> Option<String> {
    match data.get("key")? {
        Value::String(key) if !key.trim().is_empty() => Some(key.clone()),
        Value::Number(key) => Some(key.to_string()),
        _ => None,
    }
}

fn suggestion_from_item(item: &Value, id: String) -> Suggestion {
    let summary = non_empty_str(item.get("summary"));
    let body = item.get("description").and_then(SuggestionBody::from_value);

    Suggestion {
        id,
        title: summary
            .clone()
            .unwrap_or_else(|| DEFAULT_SUGGESTION_TITLE.to_owned()),
        summary,
        description: body.as_ref().map(SuggestionBody::preview).unwrap_or_default(),
        original_description: body,
        source_model: non_empty_str(item.get("llm"))
            .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_owned()),
        score: item
            .get("score")
            .and_then(Score::from_value)
            .unwrap_or(Score::Number(DEFAULT_SCORE)),
    }
}

fn legacy_suggestion(data: &Value, description: &Value, id: String) -> Suggestion {
    let summary = non_empty_str(data.get("summary"));
    let body = SuggestionBody::from_value(description);
    let preview = match &body {
        Some(body) => body.preview(),
        None => truncate_preview(&description.to_string()),
    };

    Suggestion {
        id,
        title: summary
            .clone()
            .unwrap_or_else(|| DEFAULT_SUGGESTION_TITLE.to_owned()),
        summary,
        description: preview,
        original_description: body,
        source_model: LEGACY_MODEL_LABEL.to_owned(),
        score: Score::Number(DEFAULT_SCORE),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Loose truthiness used for the legacy `description` field.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn ingest(raw: &str) -> SuggestionResult<IngestedSuggestions> {
        build_suggestions(&unwrap_payload(parse_body(raw)?), NOW)
    }

    #[test]
    fn plain_payload_maps_every_suggestion() {
        let raw = json!({
            "key": "TEST-123",
            "suggestions": [
                { "summary": "Suggestion 1", "description": "Desc 1", "llm": "GPT-4" },
                { "description": { "type": "doc", "version": 1, "content": [] }, "score": "80%" }
            ]
        })
        .to_string();

        let ingested = ingest(&raw).unwrap();
        assert_eq!(ingested.issue_key.as_str(), "TEST-123");
        assert_eq!(ingested.suggestions.len(), 2);

        let first = &ingested.suggestions[0];
        assert_eq!(first.id, format!("{NOW}-0"));
        assert_eq!(first.title, "Suggestion 1");
        assert_eq!(first.summary.as_deref(), Some("Suggestion 1"));
        assert_eq!(first.description, "Desc 1");
        assert_eq!(first.source_model, "GPT-4");
        assert_eq!(first.score, Score::Number(95.0));

        let second = &ingested.suggestions[1];
        assert_eq!(second.id, format!("{NOW}-1"));
        assert_eq!(second.title, "AI Suggestion");
        assert_eq!(second.summary, None);
        assert_eq!(second.source_model, "AI Agent");
        assert_eq!(second.score, Score::Text("80%".into()));
        assert!(matches!(
            second.original_description,
            Some(SuggestionBody::Structured(_))
        ));
    }

    #[test]
    fn array_wrapped_output_string_is_unwrapped() {
        let inner = json!({ "key": "TEST-456", "summary": "My Summary", "description": "My Description" });
        let raw = json!([{ "output": inner.to_string() }]).to_string();

        let ingested = ingest(&raw).unwrap();
        assert_eq!(ingested.issue_key.as_str(), "TEST-456");
        assert_eq!(ingested.suggestions.len(), 1);
        let legacy = &ingested.suggestions[0];
        assert_eq!(legacy.id, NOW.to_string());
        assert_eq!(legacy.title, "My Summary");
        assert_eq!(legacy.source_model, "n8n AI Agent");
        assert_eq!(
            legacy.original_description,
            Some(SuggestionBody::RawText("My Description".into()))
        );
    }

    #[test]
    fn nested_body_object_is_unwrapped() {
        let raw = json!({ "body": { "key": "GS-64", "suggestions": [] } }).to_string();
        let ingested = ingest(&raw).unwrap();
        assert_eq!(ingested.issue_key.as_str(), "GS-64");
        assert!(ingested.suggestions.is_empty());
    }

    #[test]
    fn double_encoded_body_is_parsed() {
        let payload = json!({ "key": "GS-1", "suggestions": [{ "description": "x" }] }).to_string();
        let raw = serde_json::to_string(&payload).unwrap();
        assert_eq!(ingest(&raw).unwrap().suggestions.len(), 1);
    }

    #[test]
    fn unparseable_output_falls_back_to_item() {
        let raw = json!({ "output": "{not json", "key": "GS-2", "description": "fallback" }).to_string();
        let ingested = ingest(&raw).unwrap();
        assert_eq!(ingested.issue_key.as_str(), "GS-2");
    }

    #[test]
    fn legacy_document_preview_uses_first_paragraph() {
        let long = "y".repeat(120);
        let raw = json!({
            "key": "GS-3",
            "description": {
                "type": "doc",
                "version": 1,
                "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": long }] }]
            }
        })
        .to_string();
        let ingested = ingest(&raw).unwrap();
        let preview = &ingested.suggestions[0].description;
        assert_eq!(preview.len(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = ingest(&json!({ "suggestions": [] }).to_string()).unwrap_err();
        assert!(matches!(err, SuggestionError::MissingIssueKey));
        assert!(err.to_string().contains("Missing issue key"));

        let err = ingest("[]").unwrap_err();
        assert!(matches!(err, SuggestionError::MissingIssueKey));
    }

    #[test]
    fn missing_content_is_rejected() {
        let err = ingest(&json!({ "key": "GS-4" }).to_string()).unwrap_err();
        assert!(matches!(err, SuggestionError::MissingSuggestionContent));

        let err = ingest(&json!({ "key": "GS-4", "description": "" }).to_string()).unwrap_err();
        assert!(matches!(err, SuggestionError::MissingSuggestionContent));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ingest("{ invalid json ").unwrap_err();
        assert!(matches!(err, SuggestionError::InvalidJson(_)));
        assert!(err.to_string().contains("Invalid JSON body"));
    }

    #[test]
    fn unsafe_issue_key_is_rejected() {
        let err = ingest(&json!({ "key": "../x", "description": "d" }).to_string()).unwrap_err();
        assert!(matches!(err, SuggestionError::InvalidIssueKey(_)));
    }

    #[test]
    fn numeric_key_is_accepted() {
        let ingested = ingest(&json!({ "key": 10001, "description": "d" }).to_string()).unwrap();
        assert_eq!(ingested.issue_key.as_str(), "10001");
    }
}
