/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input exceeded the maximum accepted length
    #[error("Text exceeds maximum length of {0} characters")]
    TooLong(usize),
    /// The input contained a character outside the accepted set
    #[error("Text contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// The human-readable identifier of a tracked issue (for example `GS-64`).
///
/// Issue keys are embedded into storage keys, so the accepted alphabet is kept to ASCII
/// letters, digits, `-` and `_`. Case is preserved as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey(NonEmptyText);

impl IssueKey {
    /// Maximum accepted length of an issue key.
    pub const MAX_LEN: usize = 255;

    /// Validates and wraps an issue key.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input, `TextError::TooLong` above
    /// [`IssueKey::MAX_LEN`], and `TextError::InvalidCharacter` for anything outside
    /// `[A-Za-z0-9_-]`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        if text.as_str().len() > Self::MAX_LEN {
            return Err(TextError::TooLong(Self::MAX_LEN));
        }
        if let Some(bad) = text
            .as_str()
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(TextError::InvalidCharacter(bad));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::str::FromStr for IssueKey {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for IssueKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IssueKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IssueKey::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  hello  ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" \n\t"), Err(TextError::Empty));
    }

    #[test]
    fn issue_key_accepts_project_keys() {
        let key = IssueKey::new("GS-64").unwrap();
        assert_eq!(key.as_str(), "GS-64");
        assert_eq!(key.to_string(), "GS-64");
        assert!("TEST_PROJ-1".parse::<IssueKey>().is_ok());
    }

    #[test]
    fn issue_key_rejects_path_characters() {
        assert_eq!(
            IssueKey::new("../etc/passwd"),
            Err(TextError::InvalidCharacter('.'))
        );
        assert_eq!(IssueKey::new("GS 64"), Err(TextError::InvalidCharacter(' ')));
    }

    #[test]
    fn issue_key_rejects_overlong_input() {
        let long = "A".repeat(IssueKey::MAX_LEN + 1);
        assert_eq!(IssueKey::new(long), Err(TextError::TooLong(IssueKey::MAX_LEN)));
    }

    #[test]
    fn issue_key_deserialize_validates() {
        let key: IssueKey = serde_json::from_str("\"ABC-1\"").unwrap();
        assert_eq!(key.as_str(), "ABC-1");
        assert!(serde_json::from_str::<IssueKey>("\"\"").is_err());
    }
}
