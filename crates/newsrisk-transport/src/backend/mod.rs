//! Transport backend implementations.

pub mod openai;

use serde_json::Value;

use crate::{ChatRequest, Result};

/// Trait for chat-completion transports.
///
/// This trait abstracts over the endpoint the analysis request is sent to,
/// allowing the same session code to run against the real OpenAI API, a
/// self-hosted compatible server, or a canned reply in tests.
#[allow(async_fn_in_trait)]
pub trait AnalysisTransport {
    /// Send the request and return the raw JSON reply envelope.
    ///
    /// # Errors
    /// Any non-success status, network failure, or non-JSON body.
    async fn complete(&self, request: &ChatRequest) -> Result<Value>;
}

impl<T: AnalysisTransport + ?Sized> AnalysisTransport for &T {
    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        (**self).complete(request).await
    }
}
