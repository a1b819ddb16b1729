/*!
 * Error types for the autotranslate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with a translation provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider cannot establish a session for the requested language pair
    #[error("No translation session available for {source_language} -> {target_language}: {message}")]
    SessionUnavailable {
        /// Source language code of the requested pair
        source_language: String,
        /// Target language code of the requested pair
        target_language: String,
        /// Underlying reason reported by the provider
        message: String,
    },

    /// The provider returned malformed or mismatched batch results
    #[error("Translation into '{target_language}' failed: {message}")]
    TranslationFailed {
        /// Target language of the failed batch
        target_language: String,
        /// What went wrong
        message: String,
    },

    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors that can occur while encoding or decoding a string catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The payload is not a structurally valid catalog
    #[error("Malformed string catalog: {0}")]
    Malformed(String),

    /// The document could not be encoded
    #[error("Failed to encode string catalog: {0}")]
    Encode(String),
}

/// Errors surfaced by the translation orchestrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// No target language was selected
    #[error("No target languages selected")]
    EmptySelection,

    /// A session for the language pair could not be established
    #[error("Translation session unavailable for {source_language} -> {target_language}: {message}")]
    SessionUnavailable {
        source_language: String,
        target_language: String,
        message: String,
    },

    /// The provider returned results that do not match the submitted batch
    #[error("Translation into '{target_language}' failed: {message}")]
    TranslationFailed {
        target_language: String,
        message: String,
    },

    /// The document was requested before the run finished
    #[error("Localization document is not ready (run state: {state})")]
    NotReady {
        /// Name of the state the orchestrator was in
        state: String,
    },

    /// A run was started while another one is still in flight
    #[error("A translation run is already in progress")]
    RunInProgress,

    /// The run was cancelled by the caller
    #[error("Translation run cancelled")]
    Cancelled,

    /// Any other provider-level failure
    #[error("Provider error while translating into '{target_language}': {source}")]
    Provider {
        target_language: String,
        #[source]
        source: ProviderError,
    },

    /// Error encoding the finished document
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

impl TranslationError {
    /// Convert a provider failure observed while working on `target_language`
    pub fn from_provider(error: ProviderError, target_language: &str) -> Self {
        match error {
            ProviderError::SessionUnavailable {
                source_language,
                target_language,
                message,
            } => Self::SessionUnavailable {
                source_language,
                target_language,
                message,
            },
            ProviderError::TranslationFailed {
                target_language,
                message,
            } => Self::TranslationFailed {
                target_language,
                message,
            },
            other => Self::Provider {
                target_language: target_language.to_string(),
                source: other,
            },
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from catalog handling
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
