//! OpenAI-compatible `/chat/completions` backend.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::{AnalysisTransport, ChatRequest, Result};

/// Public OpenAI API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backend posting chat requests to an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiTransport {
    /// Create a transport for the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_BASE_URL, None)
    }

    /// Create a transport for any compatible endpoint.
    ///
    /// `timeout` bounds the whole call; it is ignored on wasm32 where the
    /// browser's fetch owns the connection.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = build_client(timeout)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Endpoint root this transport posts to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TransportError::ClientBuild(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn build_client(_timeout: Option<Duration>) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| TransportError::ClientBuild(e.to_string()))
}

impl AnalysisTransport for OpenAiTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        let url = self.completions_url();
        debug!(
            "Sending {} messages to {} (model {})",
            request.messages.len(),
            url,
            request.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the endpoint's own explanation over the bare status line
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(|b| b.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });

            warn!("Analysis endpoint returned HTTP {}: {}", status.as_u16(), message);
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::MalformedEnvelope(e.to_string()))?;

        debug!("Received reply envelope from {}", url);
        Ok(envelope)
    }
}
