//! Chat-completion transport layer for newsrisk.
//!
//! This crate provides a unified interface for sending an analysis request to
//! a language-model endpoint and getting its raw reply back:
//! - `AnalysisTransport` is the seam the analysis session is generic over
//! - `OpenAiTransport` talks to any OpenAI-compatible `/chat/completions` API
//!
//! Nothing here interprets the reply content; that is the response parser's job.

mod backend;
mod error;
mod request;

pub use backend::AnalysisTransport;
pub use backend::openai::{DEFAULT_BASE_URL, OpenAiTransport};
pub use error::TransportError;
pub use request::{ChatMessage, ChatRequest, Role, SamplingParams};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
