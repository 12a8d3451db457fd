//! Issue-event trigger.
//!
//! When the issue tracker reports a created or updated issue, the snapshot is forwarded to the
//! automation workflow so it can produce suggestions. Nothing here fails the caller: every
//! downstream error is logged and the event is acknowledged regardless.

use crate::automation::{mask_url, AutomationClient, AutomationReply};
use crate::config::CoreConfig;
use crate::constants::{APPROVAL_DUE_DAYS, APPROVAL_ISSUE_TYPE};
use crate::gateway::{is_issue_reference, IssueGateway, IssueUpdate};
use crate::store::SuggestionStore;
use chrono::{DateTime, Days, NaiveDate, Utc};
use drjira_types::IssueKey;
use serde_json::{json, Value};
use std::sync::Arc;

/// What happened to one issue event.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// No automation URL is configured in settings or at startup.
    NotConfigured,
    /// The event carried no issue.
    NoIssue,
    /// The snapshot was posted to the workflow.
    Forwarded {
        due_date: Option<NaiveDate>,
        quality_stored: bool,
    },
    /// Posting the snapshot failed; details were logged.
    ForwardFailed { due_date: Option<NaiveDate> },
}

#[derive(Clone)]
pub struct TriggerService {
    store: SuggestionStore,
    gateway: Arc<dyn IssueGateway>,
    automation: AutomationClient,
    cfg: Arc<CoreConfig>,
}

impl TriggerService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: SuggestionStore,
        gateway: Arc<dyn IssueGateway>,
        automation: AutomationClient,
    ) -> Self {
        Self {
            store,
            gateway,
            automation,
            cfg,
        }
    }

    /// Handles an issue event `{ "issue": { "id", "key", "fields": { ... } } }`.
    pub async fn handle_issue_event(&self, event: &Value) -> TriggerOutcome {
        self.handle_issue_event_at(event, Utc::now()).await
    }

    /// As [`handle_issue_event`](Self::handle_issue_event) with an explicit clock.
    pub async fn handle_issue_event_at(&self, event: &Value, now: DateTime<Utc>) -> TriggerOutcome {
        let settings = self.store.settings().unwrap_or_else(|e| {
            tracing::error!("failed to read settings, using defaults: {}", e);
            Default::default()
        });

        let Some(url) = settings.automation_url(self.cfg.automation_url()) else {
            tracing::error!(
                "automation webhook URL is not configured (checked settings and N8N_WEBHOOK_URL); skipping"
            );
            return TriggerOutcome::NotConfigured;
        };
        let api_key = settings.automation_api_key(self.cfg.automation_api_key());

        let Some(issue) = event.get("issue").filter(|issue| issue.is_object()) else {
            tracing::warn!("no issue data in event");
            return TriggerOutcome::NoIssue;
        };
        let issue_key = issue.get("key").and_then(Value::as_str).unwrap_or_default();
        let fields = issue.get("fields").cloned().unwrap_or(Value::Null);

        let due_date = if fields.pointer("/issuetype/name").and_then(Value::as_str)
            != Some(APPROVAL_ISSUE_TYPE)
        {
            None
        } else if !is_issue_reference(issue_key) {
            tracing::warn!("approval request without a usable issue key ({:?}); no due date set", issue_key);
            None
        } else {
            self.set_approval_due_date(issue_key, now.date_naive()).await
        };

        tracing::info!("forwarding issue {} to automation at {}", issue_key, mask_url(url));
        let payload = issue_snapshot(event, issue, &fields, now);

        match self.automation.send(url, api_key, &payload).await {
            Ok(AutomationReply::Json(reply)) if reply.is_object() => {
                let quality_stored = self.store_quality(issue_key, &reply);
                TriggerOutcome::Forwarded {
                    due_date,
                    quality_stored,
                }
            }
            Ok(_) => {
                tracing::info!("automation accepted issue {} without a JSON report", issue_key);
                TriggerOutcome::Forwarded {
                    due_date,
                    quality_stored: false,
                }
            }
            Err(e) => {
                tracing::error!("error calling automation webhook: {}", e);
                TriggerOutcome::ForwardFailed { due_date }
            }
        }
    }

    async fn set_approval_due_date(&self, issue_key: &str, today: NaiveDate) -> Option<NaiveDate> {
        let due_date = today.checked_add_days(Days::new(APPROVAL_DUE_DAYS as u64))?;
        tracing::info!("approval request {}: setting due date to {}", issue_key, due_date);

        let update = IssueUpdate {
            due_date: Some(due_date),
            ..Default::default()
        };
        match self.gateway.update_issue(issue_key, &update).await {
            Ok(()) => Some(due_date),
            Err(e) => {
                tracing::error!("error setting due date for {}: {}", issue_key, e);
                None
            }
        }
    }

    fn store_quality(&self, issue_key: &str, report: &Value) -> bool {
        let stored = IssueKey::new(issue_key)
            .map_err(crate::SuggestionError::from)
            .and_then(|key| self.store.set_quality(&key, report));
        match stored {
            Ok(()) => {
                tracing::info!("stored quality data for issue {}", issue_key);
                true
            }
            Err(e) => {
                tracing::error!("error storing quality data for {}: {}", issue_key, e);
                false
            }
        }
    }
}

fn issue_snapshot(event: &Value, issue: &Value, fields: &Value, now: DateTime<Utc>) -> Value {
    let field = |pointer: &str| fields.pointer(pointer).cloned().unwrap_or(Value::Null);

    json!({
        "issueKey": issue.get("key"),
        "issueId": issue.get("id"),
        "summary": field("/summary"),
        "description": field("/description"),
        "project": {
            "id": field("/project/id"),
            "key": field("/project/key"),
            "name": field("/project/name"),
        },
        "issueType": {
            "id": field("/issuetype/id"),
            "name": field("/issuetype/name"),
        },
        "reporter": {
            "accountId": field("/reporter/accountId"),
            "displayName": field("/reporter/displayName"),
            "emailAddress": field("/reporter/emailAddress"),
        },
        "status": {
            "id": field("/status/id"),
            "name": field("/status/name"),
        },
        "created": field("/created"),
        "updated": field("/updated"),
        "dueDate": field("/duedate"),
        "fullEvent": event,
        "timestamp": now.to_rfc3339(),
    })
}
