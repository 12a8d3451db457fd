//! Plain-text and light-markdown conversion into ADF blocks.
//!
//! Suggestions usually arrive as freeform text with `### headers`, bare section names such as
//! `Objective:` and `*`/`-` bullet lists. The issue tracker only accepts a strict document tree,
//! so this module turns such text into typed [`Block`]s in a single line-oriented pass.
//!
//! Conversion rules, applied to each trimmed line in order:
//! - blank line: skipped, an open list stays open
//! - `#` to `######` followed by whitespace: heading (closes any open list)
//! - a bare section name from [`SECTION_HEADERS`], optionally bold and/or with a trailing
//!   colon: heading (closes any open list)
//! - `* ` or `- `: list item, appended to the open list (opening one if needed)
//! - anything else: paragraph (closes any open list)
//!
//! All headings are emitted at [`HEADING_LEVEL`]. The output always holds at least one block.

use crate::constants::{EMPTY_TEXT_PLACEHOLDER, HEADING_LEVEL, SECTION_HEADERS};
use adf::{Block, ListNode};

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind<'a> {
    ExplicitHeader(&'a str),
    ImplicitHeader(&'a str),
    ListItem(&'a str),
    Blank,
    Paragraph(&'a str),
}

/// Pending bullet list between lines.
#[derive(Debug, Default)]
enum ListState {
    #[default]
    Closed,
    Open(Vec<ListNode>),
}

impl ListState {
    fn push(&mut self, item: ListNode) {
        match self {
            ListState::Closed => *self = ListState::Open(vec![item]),
            ListState::Open(items) => items.push(item),
        }
    }

    /// Emits the open list, if any, and returns to `Closed`.
    fn flush_into(&mut self, blocks: &mut Vec<Block>) {
        if let ListState::Open(items) = std::mem::take(self) {
            blocks.push(Block::bullet_list(items));
        }
    }
}

/// Service converting suggestion text into document blocks.
#[derive(Debug, Clone, Default)]
pub struct MarkdownService;

impl MarkdownService {
    /// Creates a new `MarkdownService` instance.
    pub fn new() -> Self {
        Self
    }

    /// Converts `text` into an ordered sequence of ADF blocks.
    ///
    /// Accepts `\n` or `\r\n` line endings. Never fails: empty or whitespace-only input yields a
    /// single paragraph (empty for `""`, holding the single-space placeholder otherwise).
    ///
    /// # Example
    ///
    /// ```
    /// use drjira_core::markdown::MarkdownService;
    ///
    /// let blocks = MarkdownService::new().convert("Objective:\nShip it.\n* step one");
    /// assert_eq!(blocks.len(), 3);
    /// ```
    pub fn convert(&self, text: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut list = ListState::Closed;

        for line in text.split('\n') {
            match classify_line(line) {
                LineKind::Blank => {}
                LineKind::ExplicitHeader(heading) | LineKind::ImplicitHeader(heading) => {
                    list.flush_into(&mut blocks);
                    blocks.push(Block::heading(HEADING_LEVEL, heading));
                }
                LineKind::ListItem(item) => list.push(ListNode::item(item)),
                LineKind::Paragraph(paragraph) => {
                    list.flush_into(&mut blocks);
                    blocks.push(Block::paragraph(paragraph));
                }
            }
        }
        list.flush_into(&mut blocks);

        if blocks.is_empty() {
            blocks.push(if text.is_empty() {
                Block::empty_paragraph()
            } else {
                Block::paragraph(EMPTY_TEXT_PLACEHOLDER)
            });
        }

        blocks
    }
}

fn classify_line(raw: &str) -> LineKind<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }
    if let Some(heading) = explicit_header_text(line) {
        return LineKind::ExplicitHeader(heading);
    }
    if let Some(heading) = implicit_header_text(line) {
        return LineKind::ImplicitHeader(heading);
    }
    if line.starts_with("* ") || line.starts_with("- ") {
        return LineKind::ListItem(line[2..].trim());
    }
    LineKind::Paragraph(line)
}

/// `## Title` → `Title`. Requires 1-6 `#` followed by whitespace and some text.
fn explicit_header_text(line: &str) -> Option<&str> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let heading = rest.trim();
    (!heading.is_empty()).then_some(heading)
}

/// `**Objective:**` → `Objective` when the cleaned text is a known section name.
fn implicit_header_text(line: &str) -> Option<&str> {
    let cleaned = strip_header_decoration(line);
    SECTION_HEADERS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(cleaned))
        .then_some(cleaned)
}

fn strip_header_decoration(line: &str) -> &str {
    let text = line.strip_prefix("**").unwrap_or(line);
    let text = text.strip_suffix(':').unwrap_or(text);
    let text = text.strip_suffix("**").unwrap_or(text);
    let text = text.strip_suffix(':').unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adf::Inline;

    fn convert(text: &str) -> Vec<Block> {
        MarkdownService::new().convert(text)
    }

    fn list_texts(block: &Block) -> Vec<String> {
        match block {
            Block::BulletList { content } => content.iter().map(ListNode::plain_text).collect(),
            other => panic!("expected bullet list, got {other:?}"),
        }
    }

    #[test]
    fn plain_lines_become_one_paragraph_each() {
        let blocks = convert("First line\nSecond line\n\nThird line");
        assert_eq!(
            blocks,
            vec![
                Block::paragraph("First line"),
                Block::paragraph("Second line"),
                Block::paragraph("Third line"),
            ]
        );
    }

    #[test]
    fn consecutive_items_form_one_list() {
        let blocks = convert("* a\n* b\n* c");
        assert_eq!(blocks.len(), 1);
        assert_eq!(list_texts(&blocks[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn section_header_paragraph_and_list_keep_order() {
        let blocks = convert("Objective:\nDo the thing.\n* step one\n* step two");
        assert_eq!(
            blocks,
            vec![
                Block::heading(3, "Objective"),
                Block::paragraph("Do the thing."),
                Block::bullet_list(vec![ListNode::item("step one"), ListNode::item("step two")]),
            ]
        );
    }

    #[test]
    fn empty_input_yields_single_paragraph() {
        assert_eq!(convert(""), vec![Block::empty_paragraph()]);
        assert_eq!(convert(" "), vec![Block::paragraph(" ")]);
        assert_eq!(convert("\n  \r\n\t"), vec![Block::paragraph(" ")]);
    }

    #[test]
    fn implicit_headers_match_whole_line_case_insensitively() {
        assert_eq!(convert("objective:"), vec![Block::heading(3, "objective")]);
        assert_eq!(convert("**Objective:**"), vec![Block::heading(3, "Objective")]);
        assert_eq!(convert("**Acceptance Criteria**:"), vec![Block::heading(3, "Acceptance Criteria")]);
        assert_eq!(convert("Dependencies/Risks"), vec![Block::heading(3, "Dependencies/Risks")]);

        assert_eq!(convert("Objective details:"), vec![Block::paragraph("Objective details:")]);
        assert_eq!(
            convert("Objective discussion:"),
            vec![Block::paragraph("Objective discussion:")]
        );
        assert_eq!(
            convert("**Objective:** ship the feature"),
            vec![Block::paragraph("**Objective:** ship the feature")]
        );
    }

    #[test]
    fn bare_section_names_without_colon_are_headings() {
        let blocks = convert("Risks\n- outage\nDependencies\nNone known.\nrisks and mitigations");
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0], Block::heading(3, "Risks"));
        assert_eq!(list_texts(&blocks[1]), vec!["outage"]);
        assert_eq!(blocks[2], Block::heading(3, "Dependencies"));
        assert_eq!(blocks[3], Block::paragraph("None known."));
        assert_eq!(blocks[4], Block::paragraph("risks and mitigations"));
    }

    #[test]
    fn explicit_headers_strip_markers_and_use_level_three() {
        assert_eq!(
            convert("# Summary\n###   Next steps  "),
            vec![Block::heading(3, "Summary"), Block::heading(3, "Next steps")]
        );
    }

    #[test]
    fn hash_without_whitespace_is_a_paragraph() {
        assert_eq!(convert("#hashtag"), vec![Block::paragraph("#hashtag")]);
        assert_eq!(convert("#"), vec![Block::paragraph("#")]);
        assert_eq!(
            convert("####### seven"),
            vec![Block::paragraph("####### seven")]
        );
    }

    #[test]
    fn headers_close_open_lists() {
        let blocks = convert("- one\n### Risks\n- two");
        assert_eq!(blocks.len(), 3);
        assert_eq!(list_texts(&blocks[0]), vec!["one"]);
        assert_eq!(blocks[1], Block::heading(3, "Risks"));
        assert_eq!(list_texts(&blocks[2]), vec!["two"]);
    }

    #[test]
    fn paragraphs_close_open_lists() {
        let blocks = convert("* one\nplain\n* two");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], Block::paragraph("plain"));
    }

    #[test]
    fn blank_lines_do_not_close_lists() {
        let blocks = convert("* one\n\n* two");
        assert_eq!(blocks.len(), 1);
        assert_eq!(list_texts(&blocks[0]), vec!["one", "two"]);
    }

    #[test]
    fn crlf_and_mixed_markers_are_handled() {
        let blocks = convert("Risks:\r\n- low\r\n*   medium  \r\n");
        assert_eq!(
            blocks,
            vec![
                Block::heading(3, "Risks"),
                Block::bullet_list(vec![ListNode::item("low"), ListNode::item("medium")]),
            ]
        );
    }

    #[test]
    fn marker_without_space_is_not_a_list_item() {
        assert_eq!(convert("*bold*"), vec![Block::paragraph("*bold*")]);
        assert_eq!(convert("-5 degrees"), vec![Block::paragraph("-5 degrees")]);
    }

    #[test]
    fn plain_text_round_trip_is_stable() {
        let first = convert("  Alpha  \n\nBeta\nGamma delta");
        let reconstructed = first
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(convert(&reconstructed), first);
    }

    #[test]
    fn no_text_run_is_empty() {
        let blocks = convert("### \n* \n- x\n**:**");
        let serialised = serde_json::to_value(&blocks).unwrap().to_string();
        assert!(!serialised.contains("\"text\":\"\""), "{serialised}");
        assert!(blocks.iter().all(|block| match block {
            Block::Paragraph { content } | Block::Heading { content, .. } =>
                content.iter().all(|inline| !matches!(inline, Inline::Text { text } if text.is_empty())),
            Block::BulletList { .. } => true,
        }));
    }
}
