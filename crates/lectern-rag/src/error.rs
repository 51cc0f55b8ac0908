//! Error types for lectern-rag.

use std::fmt;

use uuid::Uuid;

/// Result type alias for lectern-rag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Text extraction from the source file failed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The OCR collaborator failed.
    #[error("ocr failed: {0}")]
    Ocr(String),

    /// The chat model could not produce an answer.
    #[error("model unavailable: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(Uuid),

    /// The caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error from the chunking and retrieval core.
    #[error(transparent)]
    Core(#[from] lectern_core::Error),
}

impl Error {
    /// Creates an extraction error.
    pub fn extraction(message: impl fmt::Display) -> Self {
        Self::Extraction(message.to_string())
    }

    /// Creates an OCR error.
    pub fn ocr(message: impl fmt::Display) -> Self {
        Self::Ocr(message.to_string())
    }

    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl fmt::Display) -> Self {
        Self::InvalidInput(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Ocr(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let error = Error::provider("openrouter", "HTTP 503");
        assert_eq!(error.to_string(), "model unavailable: openrouter: HTTP 503");
        assert!(error.is_retryable());

        let error = Error::extraction("not a pdf");
        assert_eq!(error.to_string(), "extraction failed: not a pdf");
        assert!(!error.is_retryable());
    }
}
