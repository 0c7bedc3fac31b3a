/// Error types for the machine translation providers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MtError {
    /// Provider is missing credentials or was rejected as misconfigured
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Locale code is empty or malformed
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Transport-level failure talking to the provider
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Provider answered but the translation failed
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Provider returned a different number of texts than it was given
    #[error("Provider returned {actual} translations for {expected} texts")]
    LengthMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = MtError::LengthMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Provider returned 2 translations for 3 texts"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = MtError::ConfigError("API key cannot be empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: API key cannot be empty");
    }
}
