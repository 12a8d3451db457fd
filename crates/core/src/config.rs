//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers never read environment variables; admin
//! settings edited at runtime live in the store instead (see [`crate::settings`]).

use crate::constants::DEFAULT_DATA_DIR;
use crate::{SuggestionError, SuggestionResult};
use std::path::{Path, PathBuf};

/// Credentials and location of the issue tracker's REST API.
#[derive(Clone)]
pub struct JiraConfig {
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraConfig {
    /// Create a new `JiraConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SuggestionError::Configuration` if the URL is not http(s) or a credential is
    /// blank.
    pub fn new(base_url: String, email: String, api_token: String) -> SuggestionResult<Self> {
        let base_url = validate_http_url("JIRA_BASE_URL", &base_url)?;
        if email.trim().is_empty() {
            return Err(SuggestionError::Configuration(
                "JIRA_EMAIL cannot be empty".into(),
            ));
        }
        if api_token.trim().is_empty() {
            return Err(SuggestionError::Configuration(
                "JIRA_API_TOKEN cannot be empty".into(),
            ));
        }
        Ok(Self {
            base_url,
            email: email.trim().to_owned(),
            api_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"***")
            .finish()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    jira: Option<JiraConfig>,
    automation_url: Option<String>,
    automation_api_key: Option<String>,
    webhook_api_key: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Blank optional values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `SuggestionError::Configuration` if `automation_url` is set but not http(s).
    pub fn new(
        data_dir: PathBuf,
        jira: Option<JiraConfig>,
        automation_url: Option<String>,
        automation_api_key: Option<String>,
        webhook_api_key: Option<String>,
    ) -> SuggestionResult<Self> {
        let automation_url = non_blank(automation_url)
            .map(|url| validate_http_url("N8N_WEBHOOK_URL", &url))
            .transpose()?;

        Ok(Self {
            data_dir,
            jira,
            automation_url,
            automation_api_key: non_blank(automation_api_key),
            webhook_api_key: non_blank(webhook_api_key),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn jira(&self) -> Option<&JiraConfig> {
        self.jira.as_ref()
    }

    /// Default automation workflow URL, overridable through admin settings.
    pub fn automation_url(&self) -> Option<&str> {
        self.automation_url.as_deref()
    }

    pub fn automation_api_key(&self) -> Option<&str> {
        self.automation_api_key.as_deref()
    }

    /// Shared secret the webhook sender must present, if configured.
    pub fn webhook_api_key(&self) -> Option<&str> {
        self.webhook_api_key.as_deref()
    }
}

/// Resolve the data directory, falling back to [`DEFAULT_DATA_DIR`].
pub fn resolve_data_dir(override_dir: Option<String>) -> PathBuf {
    non_blank(override_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Build a `JiraConfig` from optional raw values.
///
/// Returns `Ok(None)` when none of the three values is set, so the service can start without
/// an issue tracker (apply requests then fail with a configuration error).
///
/// # Errors
///
/// Returns `SuggestionError::Configuration` if only some of the values are set, or if they do
/// not validate.
pub fn jira_config_from_values(
    base_url: Option<String>,
    email: Option<String>,
    api_token: Option<String>,
) -> SuggestionResult<Option<JiraConfig>> {
    match (non_blank(base_url), non_blank(email), non_blank(api_token)) {
        (None, None, None) => Ok(None),
        (Some(base_url), Some(email), Some(api_token)) => {
            JiraConfig::new(base_url, email, api_token).map(Some)
        }
        _ => Err(SuggestionError::Configuration(
            "JIRA_BASE_URL, JIRA_EMAIL and JIRA_API_TOKEN must be set together".into(),
        )),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn validate_http_url(name: &str, url: &str) -> SuggestionResult<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(SuggestionError::Configuration(format!(
            "{name} must start with http:// or https://"
        )));
    }
    Ok(url.to_owned())
}
