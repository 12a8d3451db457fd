//! Suggestion service.
//!
//! Ties the store, the converter, the issue gateway and the automation client together into the
//! operations exposed over REST: webhook ingestion, listing, applying a suggestion, usage
//! statistics, admin settings and the storage browser.

use crate::automation::{AutomationClient, ConnectionTest};
use crate::config::CoreConfig;
use crate::constants::{EMPTY_TEXT_PLACEHOLDER, INVALID_DOCUMENT_PLACEHOLDER, UNKNOWN_MODEL_LABEL};
use crate::error::{SuggestionError, SuggestionResult};
use crate::gateway::{is_issue_reference, IssueGateway, IssueUpdate};
use crate::ingest::{self, IngestedSuggestions};
use crate::markdown::MarkdownService;
use crate::settings::AppSettings;
use crate::stats::UsageStats;
use crate::store::{page_limit, StoragePage, SuggestionStore};
use crate::suggestion::{Suggestion, SuggestionBody};
use crate::trigger::TriggerService;
use adf::{Block, Document};
use chrono::Utc;
use drjira_types::IssueKey;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct SuggestionService {
    cfg: Arc<CoreConfig>,
    store: SuggestionStore,
    gateway: Arc<dyn IssueGateway>,
    automation: AutomationClient,
    converter: MarkdownService,
}

impl SuggestionService {
    pub fn new(cfg: Arc<CoreConfig>, store: SuggestionStore, gateway: Arc<dyn IssueGateway>) -> Self {
        Self::with_automation(cfg, store, gateway, AutomationClient::new())
    }

    pub fn with_automation(
        cfg: Arc<CoreConfig>,
        store: SuggestionStore,
        gateway: Arc<dyn IssueGateway>,
        automation: AutomationClient,
    ) -> Self {
        Self {
            cfg,
            store,
            gateway,
            automation,
            converter: MarkdownService::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Trigger sharing this service's store, gateway and automation client.
    pub fn trigger(&self) -> TriggerService {
        TriggerService::new(
            self.cfg.clone(),
            self.store.clone(),
            self.gateway.clone(),
            self.automation.clone(),
        )
    }

    /// Parses a raw webhook body and stores its suggestions, replacing any stored for the issue.
    ///
    /// # Errors
    ///
    /// Returns the client errors of [`ingest::parse_body`] and [`ingest::build_suggestions`],
    /// or a storage error if the write fails.
    pub fn ingest_webhook(&self, raw_body: &str) -> SuggestionResult<IngestedSuggestions> {
        let payload = ingest::unwrap_payload(ingest::parse_body(raw_body)?);
        self.ingest_payload(&payload)
    }

    /// Stores the suggestions of an already unwrapped payload.
    pub fn ingest_payload(&self, payload: &Value) -> SuggestionResult<IngestedSuggestions> {
        let ingested = ingest::build_suggestions(payload, Utc::now().timestamp_millis())?;
        self.store.set(&ingested.issue_key, &ingested.suggestions)?;
        tracing::info!(
            "stored {} suggestion(s) for issue {}",
            ingested.suggestions.len(),
            ingested.issue_key
        );
        Ok(ingested)
    }

    /// Suggestions stored for `issue_key`, hiding those below the configured minimum score.
    ///
    /// Suggestions whose score cannot be read as a number are hidden whenever a minimum is set.
    pub fn list_suggestions(&self, issue_key: &IssueKey) -> SuggestionResult<Vec<Suggestion>> {
        let suggestions = self.store.get(issue_key)?.unwrap_or_default();
        let Some(min_score) = self.store.settings()?.score_threshold() else {
            return Ok(suggestions);
        };
        Ok(suggestions
            .into_iter()
            .filter(|s| s.score.value().is_some_and(|score| score >= min_score))
            .collect())
    }

    /// Writes the suggestion's description (and summary, when it has one) to the issue.
    ///
    /// `issue_id` addresses the update when given; otherwise the issue key does. On success the
    /// suggestion's source model is counted in the usage statistics. That count is best effort:
    /// a failure to record it is logged and does not fail the apply.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `SuggestionError::InvalidInput` if `suggestion_id` is empty,
    /// - `SuggestionError::NoSuggestions` if nothing is stored for the issue,
    /// - `SuggestionError::SuggestionNotFound` if no stored suggestion has that id,
    /// - the gateway's error if the update is rejected. The suggestion stays stored and can be
    ///   applied again.
    pub async fn apply_suggestion(
        &self,
        issue_key: &IssueKey,
        issue_id: Option<&str>,
        suggestion_id: &str,
    ) -> SuggestionResult<()> {
        if suggestion_id.trim().is_empty() {
            return Err(SuggestionError::InvalidInput(
                "suggestionId is required".into(),
            ));
        }
        let issue_id = issue_id.map(str::trim).filter(|id| !id.is_empty());
        if issue_id.is_some_and(|id| !is_issue_reference(id)) {
            return Err(SuggestionError::InvalidInput(
                "issueId must be a numeric id or an issue key".into(),
            ));
        }

        let stored = self
            .store
            .get(issue_key)?
            .ok_or_else(|| SuggestionError::NoSuggestions(issue_key.to_string()))?;
        let suggestion = stored
            .into_iter()
            .find(|s| s.id == suggestion_id)
            .ok_or_else(|| SuggestionError::SuggestionNotFound {
                suggestion_id: suggestion_id.to_owned(),
                issue_key: issue_key.to_string(),
            })?;

        let update = IssueUpdate {
            description: Some(self.description_document(&suggestion)?),
            summary: suggestion.summary.clone().filter(|s| !s.is_empty()),
            due_date: None,
        };
        let target = issue_id.unwrap_or(issue_key.as_str());
        self.gateway.update_issue(target, &update).await?;
        tracing::info!("applied suggestion {} to issue {}", suggestion.id, issue_key);

        self.record_usage(&suggestion.source_model);
        Ok(())
    }

    /// The description document sent for `suggestion`.
    ///
    /// Structured bodies with a `content` array are sent verbatim; structured bodies without one
    /// become a single placeholder paragraph. Text is converted, falling back to the preview and
    /// then to a single space when the body is missing or empty.
    pub fn description_document(&self, suggestion: &Suggestion) -> SuggestionResult<Value> {
        let text = match &suggestion.original_description {
            Some(SuggestionBody::Structured(map)) => {
                let document = Value::Object(map.clone());
                if adf::content_array(&document).is_some() {
                    return Ok(document);
                }
                tracing::warn!("suggestion {} has a document without content", suggestion.id);
                let fallback = Document::new(vec![Block::paragraph(INVALID_DOCUMENT_PLACEHOLDER)]);
                return Ok(adf::to_value(&fallback)?);
            }
            Some(SuggestionBody::RawText(text)) if !text.is_empty() => text.as_str(),
            _ if !suggestion.description.is_empty() => suggestion.description.as_str(),
            _ => EMPTY_TEXT_PLACEHOLDER,
        };
        let document = Document::new(self.converter.convert(text));
        Ok(adf::to_value(&document)?)
    }

    fn record_usage(&self, source_model: &str) {
        let model = if source_model.is_empty() {
            UNKNOWN_MODEL_LABEL
        } else {
            source_model
        };
        let recorded = self.store.usage_stats().and_then(|mut stats| {
            let count = stats.record(model);
            self.store.set_usage_stats(&stats).map(|()| count)
        });
        match recorded {
            Ok(count) => tracing::info!("usage for {} is now {}", model, count),
            Err(e) => tracing::error!("failed to update usage stats: {}", e),
        }
    }

    pub fn usage_stats(&self) -> SuggestionResult<UsageStats> {
        self.store.usage_stats()
    }

    pub fn settings(&self) -> SuggestionResult<AppSettings> {
        self.store.settings()
    }

    pub fn save_settings(&self, settings: &AppSettings) -> SuggestionResult<()> {
        if !settings.min_score.is_finite() || settings.min_score < 0.0 {
            return Err(SuggestionError::InvalidInput(
                "minScore must be a non-negative number".into(),
            ));
        }
        self.store.set_settings(settings)?;
        tracing::info!("saved settings (minScore {})", settings.min_score);
        Ok(())
    }

    /// One page of raw storage entries; `limit` is clamped to the allowed page sizes.
    pub fn storage_page(&self, cursor: Option<&str>, limit: Option<usize>) -> SuggestionResult<StoragePage> {
        self.store
            .raw()
            .query(cursor.filter(|c| !c.is_empty()), page_limit(limit))
    }

    /// Probes the automation URL.
    pub async fn test_connection(&self, url: &str, api_key: Option<&str>) -> SuggestionResult<ConnectionTest> {
        self.automation.test_connection(url, api_key).await
    }
}
