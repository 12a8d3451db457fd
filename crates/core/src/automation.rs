//! Client for the external automation workflow (n8n) that generates suggestions.
//!
//! The workflow is reached through a single webhook URL protected by an optional bearer token.
//! Issue snapshots are posted to it, and it answers asynchronously by calling this service's
//! own webhook with suggestions.

use crate::error::{SuggestionError, SuggestionResult};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

lazy_static::lazy_static! {
    static ref QUERY_VALUE_RE: Regex = Regex::new(r"([?&])([^=&]+)=([^&]+)").unwrap();
}

/// Result of probing the automation URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

/// Successful reply from the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum AutomationReply {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct AutomationClient {
    client: reqwest::Client,
}

impl AutomationClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Posts a small test message to `url` and reports the HTTP status.
    ///
    /// # Errors
    ///
    /// Returns `SuggestionError::InvalidInput` for a blank URL and `SuggestionError::Http` if
    /// the request cannot be sent at all. Non-2xx statuses are reported, not returned as errors.
    pub async fn test_connection(
        &self,
        url: &str,
        api_key: Option<&str>,
    ) -> SuggestionResult<ConnectionTest> {
        if url.trim().is_empty() {
            return Err(SuggestionError::InvalidInput("URL is required".into()));
        }

        let body = json!({
            "test": true,
            "message": "Hello from Dr. Jira settings!",
            "timestamp": Utc::now().to_rfc3339(),
        });
        let mut request = self.client.post(url.trim()).json(&body);
        if let Some(key) = api_key.filter(|key| !key.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("test connection to {} failed: {}", mask_url(url), e);
            SuggestionError::Http(e)
        })?;

        let status = response.status();
        Ok(ConnectionTest {
            success: status.is_success(),
            status: status.as_u16(),
            status_text: (!status.is_success())
                .then(|| status.canonical_reason().unwrap_or("Unknown Status").to_owned()),
        })
    }

    /// Posts `payload` to the workflow.
    ///
    /// The bearer header is always sent (empty when no key is configured), matching what the
    /// workflow's header-auth node expects.
    ///
    /// # Errors
    ///
    /// Returns `SuggestionError::Http` on transport failure and
    /// `SuggestionError::AutomationRejected` for non-2xx replies.
    pub async fn send(
        &self,
        url: &str,
        api_key: Option<&str>,
        payload: &Value,
    ) -> SuggestionResult<AutomationReply> {
        let response = self
            .client
            .post(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", api_key.unwrap_or_default()),
            )
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(match serde_json::from_str::<Value>(&text) {
                Ok(value) => AutomationReply::Json(value),
                Err(_) => AutomationReply::Text(text),
            });
        }

        let parsed = serde_json::from_str::<Value>(&text).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or(text);

        if status == reqwest::StatusCode::NOT_FOUND && message.contains("not registered") {
            tracing::warn!(
                "automation webhook is not active; activate the workflow so its production URL accepts calls"
            );
        }

        Err(SuggestionError::AutomationRejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Replaces query-parameter values with `***` so URLs can be logged.
pub fn mask_url(url: &str) -> String {
    QUERY_VALUE_RE.replace_all(url, "$1$2=***").into_owned()
}
