//! # Dr. Jira Core
//!
//! Core logic for the issue-suggestion service:
//! - Webhook ingestion of AI-generated suggestions, stored per issue key
//! - Text-to-document conversion used when a suggestion is applied
//! - Issue updates through the [`gateway::IssueGateway`] seam
//! - Usage statistics, admin settings and the issue-event trigger
//!
//! **No API concerns**: HTTP servers, routing and authentication belong in `api-rest` and
//! `api-shared`.

pub mod automation;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod markdown;
pub mod service;
pub mod settings;
pub mod stats;
pub mod store;
pub mod suggestion;
pub mod trigger;

pub use config::{CoreConfig, JiraConfig};
pub use error::{SuggestionError, SuggestionResult};
pub use gateway::{DisabledGateway, IssueGateway, IssueUpdate, JiraGateway};
pub use markdown::MarkdownService;
pub use service::SuggestionService;
pub use settings::AppSettings;
pub use stats::UsageStats;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoragePage, SuggestionStore};
pub use suggestion::{Score, Suggestion, SuggestionBody};
pub use trigger::{TriggerOutcome, TriggerService};

pub use drjira_types::IssueKey;
