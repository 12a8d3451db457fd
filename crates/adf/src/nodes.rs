//! Typed ADF nodes.
//!
//! Every node serialises with a `type` discriminator, matching the wire format expected by the
//! issue tracker's REST API:
//!
//! ```json
//! { "type": "doc", "version": 1, "content": [
//!     { "type": "heading", "attrs": { "level": 3 }, "content": [{ "type": "text", "text": "Objective" }] },
//!     { "type": "bulletList", "content": [
//!         { "type": "listItem", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "a" }] }] }
//!     ] }
//! ] }
//! ```

use serde::{Deserialize, Serialize};

/// Current ADF schema version.
pub const ADF_VERSION: u32 = 1;

/// Root discriminator of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    #[default]
    Doc,
}

/// The root node: an ordered sequence of block nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: DocKind,
    pub version: u32,
    pub content: Vec<Block>,
}

impl Document {
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            kind: DocKind::Doc,
            version: ADF_VERSION,
            content,
        }
    }
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    /// A paragraph. Empty content renders as a blank line but the node must still be present.
    Paragraph {
        #[serde(default)]
        content: Vec<Inline>,
    },
    Heading {
        attrs: HeadingAttrs,
        content: Vec<Inline>,
    },
    BulletList {
        content: Vec<ListNode>,
    },
}

impl Block {
    /// A paragraph holding a single text run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    pub fn empty_paragraph() -> Self {
        Block::Paragraph {
            content: Vec::new(),
        }
    }

    /// A heading at `level` holding a single text run.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            attrs: HeadingAttrs { level },
            content: vec![Inline::text(text)],
        }
    }

    pub fn bullet_list(items: Vec<ListNode>) -> Self {
        Block::BulletList { content: items }
    }

    /// Concatenated text of the node's inline runs. Lists yield their items joined by `\n`.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                content.iter().map(Inline::as_str).collect()
            }
            Block::BulletList { content } => content
                .iter()
                .map(ListNode::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

/// Children of a bullet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ListNode {
    ListItem { content: Vec<Block> },
}

impl ListNode {
    /// A list item wrapping one paragraph with a single text run.
    pub fn item(text: impl Into<String>) -> Self {
        ListNode::ListItem {
            content: vec![Block::paragraph(text)],
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            ListNode::ListItem { content } => content
                .iter()
                .map(Block::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Inline nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Inline::Text { text } => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heading_serialises_with_level_attr() {
        let value = serde_json::to_value(Block::heading(3, "Objective")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "heading",
                "attrs": { "level": 3 },
                "content": [{ "type": "text", "text": "Objective" }]
            })
        );
    }

    #[test]
    fn bullet_list_wraps_items_in_paragraphs() {
        let list = Block::bullet_list(vec![ListNode::item("a")]);
        let value = serde_json::to_value(list).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "bulletList",
                "content": [{
                    "type": "listItem",
                    "content": [{
                        "type": "paragraph",
                        "content": [{ "type": "text", "text": "a" }]
                    }]
                }]
            })
        );
    }

    #[test]
    fn empty_paragraph_keeps_content_array() {
        let value = serde_json::to_value(Block::empty_paragraph()).unwrap();
        assert_eq!(value, json!({ "type": "paragraph", "content": [] }));
    }

    #[test]
    fn document_root_carries_type_and_version() {
        let doc = Document::new(vec![Block::paragraph("hi")]);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "doc");
        assert_eq!(value["version"], 1);
        assert_eq!(value["content"][0]["content"][0]["text"], "hi");
    }

    #[test]
    fn paragraph_without_content_deserialises() {
        let block: Block = serde_json::from_value(json!({ "type": "paragraph" })).unwrap();
        assert_eq!(block, Block::empty_paragraph());
    }

    #[test]
    fn plain_text_flattens_lists() {
        let list = Block::bullet_list(vec![ListNode::item("one"), ListNode::item("two")]);
        assert_eq!(list.plain_text(), "one\ntwo");
    }
}
