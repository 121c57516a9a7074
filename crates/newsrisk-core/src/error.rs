//! Error types for the newsrisk-core library.

use thiserror::Error;

use newsrisk_transport::TransportError;

/// Main error type for the newsrisk library.
#[derive(Error, Debug)]
pub enum NewsRiskError {
    /// The analysis endpoint could not be reached or rejected the call.
    ///
    /// Shown to the user as-is, so it carries the endpoint's own message.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply envelope lacks `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Input rejected before any network call.
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),

    /// A second analysis was triggered while one is still outstanding.
    #[error("an analysis is already in progress")]
    AnalysisInProgress,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while validating user input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputValidationError {
    /// The news text is empty or whitespace.
    #[error("please enter news text to analyze")]
    EmptyText,

    /// No API key is configured.
    #[error("please set your OpenAI API key in the settings")]
    MissingApiKey,
}

/// Result type for the newsrisk library.
pub type Result<T> = std::result::Result<T, NewsRiskError>;
