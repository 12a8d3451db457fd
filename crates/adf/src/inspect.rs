//! Read helpers over untyped (pass-through) documents.

use serde_json::Value;

/// Returns the `content` array of a document object, if it has one.
pub fn content_array(document: &Value) -> Option<&Vec<Value>> {
    document.get("content").and_then(Value::as_array)
}

/// Returns the text of the first inline run of the first paragraph block.
///
/// Used to build short previews of structured suggestions.
pub fn first_paragraph_text(document: &Value) -> Option<&str> {
    content_array(document)?
        .iter()
        .find(|node| node.get("type").and_then(Value::as_str) == Some("paragraph"))
        .and_then(content_array)
        .and_then(|inlines| inlines.first())
        .and_then(|inline| inline.get("text"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_paragraph_text_skips_headings() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                { "type": "heading", "attrs": { "level": 2 }, "content": [{ "type": "text", "text": "Title" }] },
                { "type": "paragraph", "content": [{ "type": "text", "text": "Body" }] }
            ]
        });
        assert_eq!(first_paragraph_text(&doc), Some("Body"));
    }

    #[test]
    fn first_paragraph_text_handles_missing_pieces() {
        assert_eq!(first_paragraph_text(&json!({})), None);
        assert_eq!(
            first_paragraph_text(&json!({ "content": [{ "type": "paragraph", "content": [] }] })),
            None
        );
        assert_eq!(first_paragraph_text(&json!("text")), None);
    }

    #[test]
    fn content_array_requires_an_array() {
        assert!(content_array(&json!({ "content": "nope" })).is_none());
        assert_eq!(content_array(&json!({ "content": [] })).map(Vec::len), Some(0));
    }
}
