#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid JSON body: {0}")]
    InvalidJson(serde_json::Error),
    #[error("Missing issue key in payload")]
    MissingIssueKey,
    #[error("Missing description or suggestions in payload")]
    MissingSuggestionContent,
    #[error("invalid issue key: {0}")]
    InvalidIssueKey(#[from] drjira_types::TextError),

    #[error("No suggestions found for issue {0}")]
    NoSuggestions(String),
    #[error("Suggestion with ID {suggestion_id} not found for issue {issue_key}")]
    SuggestionNotFound {
        suggestion_id: String,
        issue_key: String,
    },

    #[error("Failed to update issue: {status_text}")]
    IssueUpdateRejected {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("Connection failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("automation webhook returned error ({status}): {message}")]
    AutomationRejected { status: u16, message: String },
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read storage entry: {0}")]
    StorageRead(std::io::Error),
    #[error("failed to write storage entry: {0}")]
    StorageWrite(std::io::Error),
    #[error("invalid storage key: {0}")]
    InvalidStorageKey(String),
    #[error("failed to serialize value: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize value: {0}")]
    Deserialization(serde_json::Error),
    #[error("document error: {0}")]
    Document(#[from] adf::AdfError),
}

pub type SuggestionResult<T> = std::result::Result<T, SuggestionError>;
