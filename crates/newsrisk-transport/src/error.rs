//! Error types for the transport layer.

use thiserror::Error;

/// Errors that can occur while talking to the analysis endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint answered with a non-success status.
    ///
    /// `message` is the endpoint's own `error.message` when it sent one,
    /// otherwise the canonical reason for the status code.
    #[error("API Error: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be read as a JSON envelope.
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),

    /// The HTTP client could not be built.
    #[error("failed to create client: {0}")]
    ClientBuild(String),
}

impl TransportError {
    /// HTTP status reported by the endpoint, if the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
