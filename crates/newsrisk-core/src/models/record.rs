//! Extraction records and raw model replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NewsRiskError;

/// One reported criticism instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Criticized entity, expected verbatim in the source text.
    pub company: String,

    /// Exact substring of the source text containing the criticism.
    pub citation: String,

    /// Institutional critic (NGO, agency). Empty when unspecified.
    #[serde(default, alias = "criticizedBy")]
    pub criticized_by: String,
}

impl ExtractionRecord {
    /// Create a record, trimming surrounding whitespace from every field.
    pub fn new(
        company: impl AsRef<str>,
        citation: impl AsRef<str>,
        criticized_by: impl AsRef<str>,
    ) -> Self {
        Self {
            company: company.as_ref().trim().to_string(),
            citation: citation.as_ref().trim().to_string(),
            criticized_by: criticized_by.as_ref().trim().to_string(),
        }
    }

    /// A record is kept only when both company and citation are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.company.trim().is_empty() && !self.citation.trim().is_empty()
    }

    /// Whether a named institutional critic was reported.
    pub fn has_source(&self) -> bool {
        !self.criticized_by.trim().is_empty()
    }
}

/// A raw reply from the analysis endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Full chat-completion envelope as returned by the endpoint.
    Envelope(Value),

    /// Message content only.
    Content(String),
}

impl ModelReply {
    /// The message content string carried by this reply.
    ///
    /// # Errors
    /// `MalformedResponse` when the envelope has no
    /// `choices[0].message.content` string.
    pub fn content(&self) -> Result<&str, NewsRiskError> {
        match self {
            ModelReply::Content(content) => Ok(content),
            ModelReply::Envelope(Value::String(content)) => Ok(content),
            ModelReply::Envelope(envelope) => envelope
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    NewsRiskError::MalformedResponse(
                        "reply has no choices[0].message.content string".to_string(),
                    )
                }),
        }
    }
}

impl From<Value> for ModelReply {
    fn from(value: Value) -> Self {
        ModelReply::Envelope(value)
    }
}

impl From<String> for ModelReply {
    fn from(content: String) -> Self {
        ModelReply::Content(content)
    }
}

impl From<&str> for ModelReply {
    fn from(content: &str) -> Self {
        ModelReply::Content(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_validity() {
        assert!(ExtractionRecord::new("Acme", "Acme polluted", "").is_valid());
        assert!(!ExtractionRecord::new("  ", "Acme polluted", "EPA").is_valid());
        assert!(!ExtractionRecord::new("Acme", "\t", "EPA").is_valid());
    }

    #[test]
    fn test_record_deserializes_without_source() {
        let record: ExtractionRecord =
            serde_json::from_value(json!({"company": "Acme", "citation": "c1"})).unwrap();
        assert_eq!(record.criticized_by, "");
    }

    #[test]
    fn test_envelope_content() {
        let reply = ModelReply::from(json!({
            "choices": [{"message": {"role": "assistant", "content": "[]"}}]
        }));
        assert_eq!(reply.content().unwrap(), "[]");
    }

    #[test]
    fn test_envelope_without_choices_is_malformed() {
        let reply = ModelReply::from(json!({"id": "chatcmpl-1", "choices": []}));
        assert!(matches!(
            reply.content(),
            Err(NewsRiskError::MalformedResponse(_))
        ));
    }
}
