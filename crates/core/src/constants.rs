//! Constants used throughout the Dr. Jira core crate.
//!
//! Storage keys, defaults and placeholder strings live here so the webhook, apply and trigger
//! flows agree on them.

/// Default directory for the file-backed store when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "drjira_data";

/// Sub-directory of the data directory holding one JSON file per storage key.
pub const KV_DIR_NAME: &str = "kv";

/// Storage key prefix for the suggestion array of an issue.
pub const SUGGESTIONS_KEY_PREFIX: &str = "suggestions-";

/// Storage key prefix for the quality report returned by the automation workflow.
pub const QUALITY_KEY_PREFIX: &str = "quality-";

/// Storage key of the admin settings.
pub const APP_CONFIG_KEY: &str = "appConfig";

/// Storage key of the per-model usage counter.
pub const USAGE_STATS_KEY: &str = "llm-usage-stats";

/// Heading level used for every heading the converter emits.
pub const HEADING_LEVEL: u8 = 3;

/// Section names promoted to headings when they appear alone on a line.
pub const SECTION_HEADERS: &[&str] = &[
    "Objective",
    "Business Justification",
    "Technical or Operational Details",
    "Acceptance Criteria",
    "Dependencies/Risks",
    "Risk/Dependencies",
    "Risks",
    "Dependencies",
];

/// Text substituted when a suggestion has no usable description text at all.
pub const EMPTY_TEXT_PLACEHOLDER: &str = " ";

/// Text of the single paragraph sent when a structured description has no content array.
pub const INVALID_DOCUMENT_PLACEHOLDER: &str = "Invalid ADF";

/// Maximum number of characters kept in a suggestion preview before `...` is appended.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Preview used when a structured description has no readable first paragraph.
pub const STRUCTURED_PREVIEW_FALLBACK: &str = "Updated description available";

pub const DEFAULT_SUGGESTION_TITLE: &str = "AI Suggestion";
pub const DEFAULT_MODEL_LABEL: &str = "AI Agent";
pub const LEGACY_MODEL_LABEL: &str = "n8n AI Agent";
pub const UNKNOWN_MODEL_LABEL: &str = "Unknown Model";

/// Confidence recorded when the payload does not carry one.
pub const DEFAULT_SCORE: f64 = 95.0;

/// Issue type whose due date is set automatically when an issue event arrives.
pub const APPROVAL_ISSUE_TYPE: &str = "Service request with approvals";

/// Days added to today's date for the automatic due date.
pub const APPROVAL_DUE_DAYS: i64 = 7;

/// Page size bounds of the storage browser.
pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;
