//! Model reply parsing.

mod parser;
pub mod patterns;

pub use parser::FallbackReplyParser;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::record::{ExtractionRecord, ModelReply};

/// Which step of the fallback chain produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// JSON array between the first `[` and the last `]`.
    BoundedJson,
    /// The whole content parsed as a JSON array.
    WholeJson,
    /// Blank-line separated `Key: value` paragraphs.
    KeyValue,
    /// Field-by-field regex scan of the whole content.
    RegexSalvage,
}

/// Outcome of parsing one reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Records in reply order.
    pub records: Vec<ExtractionRecord>,

    /// Strategy that produced `records`; `None` when every step came up empty.
    pub strategy: Option<ParseStrategy>,

    /// Why earlier strategies were skipped, and any envelope problems.
    pub diagnostics: Vec<String>,
}

impl ParseReport {
    /// No records found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trait for reply parsers.
pub trait ReplyParser {
    /// Parse the message content of a reply.
    fn parse_content(&self, content: &str) -> ParseReport;

    /// Parse a raw reply, envelope or content.
    ///
    /// A malformed envelope is not an error here: it yields an empty report
    /// carrying the reason as a diagnostic.
    fn parse_reply(&self, reply: &ModelReply) -> ParseReport {
        match reply.content() {
            Ok(content) => self.parse_content(content),
            Err(e) => {
                warn!("Treating reply as empty: {}", e);
                ParseReport {
                    diagnostics: vec![e.to_string()],
                    ..ParseReport::default()
                }
            }
        }
    }
}
