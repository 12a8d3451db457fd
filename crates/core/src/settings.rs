//! Admin settings persisted in the store.
//!
//! These are edited at runtime through the REST API and take precedence over the startup
//! defaults in [`crate::config::CoreConfig`].

use serde::{Deserialize, Serialize};

/// Admin-editable settings, stored under `appConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Suggestions scoring below this are hidden from listings. `0` disables filtering.
    #[serde(default)]
    pub min_score: f64,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Automation workflow URL receiving issue events. Empty means "use the startup default".
    #[serde(default)]
    pub n8n_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n8n_api_key: Option<String>,
}

fn default_model_name() -> String {
    "Default".to_owned()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            model_name: default_model_name(),
            n8n_url: String::new(),
            n8n_api_key: None,
        }
    }
}

impl AppSettings {
    /// The configured minimum score, if filtering is enabled.
    pub fn score_threshold(&self) -> Option<f64> {
        (self.min_score > 0.0).then_some(self.min_score)
    }

    /// Settings URL if set, otherwise `fallback`.
    pub fn automation_url<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        Some(self.n8n_url.trim())
            .filter(|url| !url.is_empty())
            .or(fallback)
    }

    /// Settings API key if set, otherwise `fallback`.
    pub fn automation_api_key<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.n8n_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: AppSettings = serde_json::from_value(json!({ "minScore": 85 })).unwrap();
        assert_eq!(settings.min_score, 85.0);
        assert_eq!(settings.model_name, "Default");
        assert_eq!(settings.n8n_url, "");
        assert_eq!(settings.score_threshold(), Some(85.0));
    }

    #[test]
    fn zero_score_disables_filtering() {
        assert_eq!(AppSettings::default().score_threshold(), None);
    }

    #[test]
    fn stored_automation_values_override_fallbacks() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.automation_url(Some("http://env")), Some("http://env"));
        assert_eq!(settings.automation_api_key(None), None);

        settings.n8n_url = "http://stored".into();
        settings.n8n_api_key = Some("secret".into());
        assert_eq!(settings.automation_url(Some("http://env")), Some("http://stored"));
        assert_eq!(settings.automation_api_key(Some("env")), Some("secret"));
    }
}
