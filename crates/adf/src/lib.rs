//! Atlassian Document Format (ADF) boundary support.
//!
//! This crate owns the typed node vocabulary the suggestion service produces when it writes an
//! issue description, plus small read helpers for documents received from elsewhere.
//!
//! Documents that arrive already structured are never decoded into the typed nodes here: they
//! may carry node kinds this crate does not model (tables, panels, marks) and must reach the
//! issue tracker unchanged. The helpers in [`inspect`] read them as plain JSON instead.

pub mod inspect;
pub mod nodes;

pub use inspect::{content_array, first_paragraph_text};
pub use nodes::{Block, DocKind, Document, HeadingAttrs, Inline, ListNode};

use thiserror::Error;

/// Errors returned by the `adf` boundary crate.
#[derive(Debug, Error)]
pub enum AdfError {
    #[error("invalid document JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Serialise a typed document to a JSON value ready for an issue-update request.
pub fn to_value(document: &Document) -> Result<serde_json::Value, AdfError> {
    Ok(serde_json::to_value(document)?)
}
