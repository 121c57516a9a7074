//! Core library for ESG news criticism analysis.
//!
//! This crate provides:
//! - The fixed analysis prompt sent alongside the news text
//! - A fallback-chain parser turning loosely formatted model replies into
//!   extraction records
//! - A span compositor that re-locates citations, companies and sources in
//!   the original text as properly nested highlight regions
//! - A per-company summary aggregator and HTML renderers
//! - An analysis session tying the pieces to a chat-completion transport

pub mod error;
pub mod escape;
pub mod highlight;
pub mod models;
pub mod prompt;
pub mod render;
pub mod reply;
pub mod session;
pub mod summary;

pub use error::{InputValidationError, NewsRiskError, Result};
pub use escape::{escape_pattern, literal_regex};
pub use highlight::{
    HighlightKind, HighlightOutcome, HighlightSpan, HighlightedDocument, Node, SpanCompositor,
    highlight,
};
pub use models::config::{ApiConfig, ExtensionSettings, HighlightColors, ModelId, NewsRiskConfig};
pub use models::record::{ExtractionRecord, ModelReply};
pub use render::{highlight_html, report_file_name, report_html, summary_html};
pub use reply::{FallbackReplyParser, ParseReport, ParseStrategy, ReplyParser};
pub use session::{Analysis, AnalysisSession};
pub use summary::{CompanyGroup, CompanySummary, SummaryEntry, SummaryOutcome, summarize};

/// Re-export transport types.
pub use newsrisk_transport::{AnalysisTransport, ChatRequest, OpenAiTransport, TransportError};
