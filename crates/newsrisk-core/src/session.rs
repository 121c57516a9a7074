//! Analysis session: validation, the single in-flight call, and the current
//! record set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use newsrisk_transport::{AnalysisTransport, ChatRequest};

use crate::error::{InputValidationError, NewsRiskError, Result};
use crate::highlight::{HighlightOutcome, highlight};
use crate::models::config::{HighlightColors, NewsRiskConfig};
use crate::models::record::{ExtractionRecord, ModelReply};
use crate::prompt::analysis_prompt;
use crate::render;
use crate::reply::{FallbackReplyParser, ParseStrategy, ReplyParser};
use crate::summary::{SummaryOutcome, summarize};

/// Everything one analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// The analyzed text, trimmed.
    pub text: String,

    /// Parsed records in reply order.
    pub records: Vec<ExtractionRecord>,

    /// Parser step that produced the records.
    pub strategy: Option<ParseStrategy>,

    /// Parser and envelope diagnostics.
    pub diagnostics: Vec<String>,

    pub highlight: HighlightOutcome,
    pub summary: SummaryOutcome,
}

impl Analysis {
    /// Build an analysis from a reply obtained elsewhere.
    pub fn from_reply(text: &str, reply: &ModelReply) -> Self {
        Self::from_reply_with(&FallbackReplyParser::new(), text, reply)
    }

    /// Same as [`Analysis::from_reply`] with a specific parser.
    pub fn from_reply_with(parser: &impl ReplyParser, text: &str, reply: &ModelReply) -> Self {
        let report = parser.parse_reply(reply);
        Self::from_records(text, report.records, report.strategy, report.diagnostics)
    }

    fn from_records(
        text: &str,
        records: Vec<ExtractionRecord>,
        strategy: Option<ParseStrategy>,
        diagnostics: Vec<String>,
    ) -> Self {
        Self {
            text: text.to_string(),
            highlight: highlight(text, &records),
            summary: summarize(&records),
            records,
            strategy,
            diagnostics,
        }
    }

    /// Whether any criticism was found.
    pub fn has_findings(&self) -> bool {
        !self.records.is_empty()
    }

    /// Highlighted text as HTML.
    pub fn highlight_html(&self, colors: &HighlightColors) -> String {
        render::highlight_html(&self.highlight, colors)
    }

    /// Per-company summary as HTML.
    pub fn summary_html(&self) -> String {
        render::summary_html(&self.summary)
    }

    /// Standalone HTML report.
    pub fn report_html(&self, colors: &HighlightColors, generated_at: chrono::NaiveDateTime) -> String {
        render::report_html(&self.highlight, &self.summary, colors, generated_at)
    }
}

/// Releases the in-flight flag when dropped, on success and error alike.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One analysis session over a transport.
///
/// At most one analysis is outstanding at a time; a second call while one is
/// in flight fails with [`NewsRiskError::AnalysisInProgress`]. The current
/// record set is replaced wholesale after each successful call.
pub struct AnalysisSession<T: AnalysisTransport> {
    transport: T,
    config: NewsRiskConfig,
    parser: FallbackReplyParser,
    in_flight: AtomicBool,
    records: Mutex<Arc<[ExtractionRecord]>>,
}

impl<T: AnalysisTransport> AnalysisSession<T> {
    pub fn new(transport: T, config: NewsRiskConfig) -> Self {
        Self {
            transport,
            config,
            parser: FallbackReplyParser::new(),
            in_flight: AtomicBool::new(false),
            records: Mutex::new(Arc::from(Vec::new())),
        }
    }

    /// Use a differently configured parser.
    pub fn with_parser(mut self, parser: FallbackReplyParser) -> Self {
        self.parser = parser;
        self
    }

    /// Start from an existing record set, e.g. when rebuilding a session
    /// with new settings.
    pub fn with_records(self, records: impl Into<Arc<[ExtractionRecord]>>) -> Self {
        self.replace_shared(records.into());
        self
    }

    pub fn config(&self) -> &NewsRiskConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: NewsRiskConfig) {
        self.config = config;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether an analysis call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Records from the last successful analysis.
    pub fn current_records(&self) -> Arc<[ExtractionRecord]> {
        match self.records.lock() {
            Ok(records) => Arc::clone(&records),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Drop the current record set.
    pub fn clear(&self) {
        self.replace_records(Vec::new());
    }

    /// Send `text` for analysis and parse the reply.
    ///
    /// # Errors
    /// - `InputValidation` for blank text or a missing API key, before any call
    /// - `AnalysisInProgress` while another call is outstanding
    /// - `Transport` when the endpoint fails; current records are kept
    ///
    /// A reply without usable content is not an error: it produces an
    /// analysis with no records.
    pub async fn analyze(&self, text: &str) -> Result<Analysis> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputValidationError::EmptyText.into());
        }
        if !self.config.api.has_api_key() {
            return Err(InputValidationError::MissingApiKey.into());
        }

        let Some(_guard) = BusyGuard::acquire(&self.in_flight) else {
            warn!("Analysis requested while another is in flight");
            return Err(NewsRiskError::AnalysisInProgress);
        };

        let request = ChatRequest::analysis(
            self.config.api.model.as_str(),
            analysis_prompt(),
            text,
            self.config.api.sampling(),
        );

        info!(
            "Analyzing {} chars with {}",
            text.chars().count(),
            self.config.api.model
        );
        let envelope = self.transport.complete(&request).await?;

        let report = self.parser.parse_reply(&ModelReply::Envelope(envelope));
        debug!(
            "Reply parsed: {} records, strategy {:?}",
            report.records.len(),
            report.strategy
        );

        self.replace_records(report.records.clone());
        Ok(Analysis::from_records(
            text,
            report.records,
            report.strategy,
            report.diagnostics,
        ))
    }

    fn replace_records(&self, records: Vec<ExtractionRecord>) {
        self.replace_shared(Arc::from(records));
    }

    fn replace_shared(&self, records: Arc<[ExtractionRecord]>) {
        match self.records.lock() {
            Ok(mut current) => *current = records,
            Err(poisoned) => *poisoned.into_inner() = records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsrisk_transport::{Role, TransportError};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::cell::RefCell;

    /// Replies with canned results and records each request.
    struct CannedTransport {
        replies: RefCell<Vec<newsrisk_transport::Result<Value>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl CannedTransport {
        fn new(replies: Vec<newsrisk_transport::Result<Value>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl AnalysisTransport for CannedTransport {
        async fn complete(&self, request: &ChatRequest) -> newsrisk_transport::Result<Value> {
            self.requests.borrow_mut().push(request.clone());
            self.replies.borrow_mut().remove(0)
        }
    }

    /// Never completes; used to observe the busy flag.
    struct PendingTransport;

    impl AnalysisTransport for PendingTransport {
        async fn complete(&self, _request: &ChatRequest) -> newsrisk_transport::Result<Value> {
            std::future::pending().await
        }
    }

    fn envelope(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    fn config() -> NewsRiskConfig {
        let mut config = NewsRiskConfig::default();
        config.api.api_key = "sk-test".to_string();
        config
    }

    #[tokio::test]
    async fn test_analyze_parses_and_stores_records() {
        let transport = CannedTransport::new(vec![Ok(envelope(
            r#"[{"company":"Acme","citation":"Acme polluted the river","criticized_by":"EPA"}]"#,
        ))]);
        let session = AnalysisSession::new(transport, config());

        let analysis = session
            .analyze("  Acme polluted the river, the EPA said.  ")
            .await
            .unwrap();

        assert_eq!(analysis.text, "Acme polluted the river, the EPA said.");
        assert_eq!(
            analysis.records,
            vec![ExtractionRecord::new("Acme", "Acme polluted the river", "EPA")]
        );
        assert!(matches!(analysis.highlight, HighlightOutcome::Document(_)));
        assert_eq!(session.current_records().len(), 1);
        assert!(!session.is_busy());

        let requests = session.transport().requests.borrow();
        assert_eq!(requests[0].model, "gpt-4-turbo");
        assert_eq!(requests[0].max_tokens, 2000);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[0].content, analysis_prompt());
        assert_eq!(requests[0].messages[1].content, "Acme polluted the river, the EPA said.");
    }

    #[tokio::test]
    async fn test_input_validation_happens_before_transport() {
        let session = AnalysisSession::new(CannedTransport::new(Vec::new()), config());
        let err = session.analyze("   \n").await.unwrap_err();
        assert!(matches!(
            err,
            NewsRiskError::InputValidation(InputValidationError::EmptyText)
        ));

        let session = AnalysisSession::new(CannedTransport::new(Vec::new()), NewsRiskConfig::default());
        let err = session.analyze("Acme polluted").await.unwrap_err();
        assert!(matches!(
            err,
            NewsRiskError::InputValidation(InputValidationError::MissingApiKey)
        ));
        assert!(session.transport().requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_keeps_previous_records_and_releases_flag() {
        let transport = CannedTransport::new(vec![
            Ok(envelope(r#"[{"company":"Acme","citation":"c1"}]"#)),
            Err(TransportError::Api {
                status: 401,
                message: "Incorrect API key provided".to_string(),
            }),
        ]);
        let session = AnalysisSession::new(transport, config());

        session.analyze("c1").await.unwrap();
        let err = session.analyze("c2").await.unwrap_err();

        assert_eq!(err.to_string(), "API Error: Incorrect API key provided");
        assert_eq!(session.current_records().len(), 1);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_an_empty_analysis() {
        let transport = CannedTransport::new(vec![
            Ok(envelope(r#"[{"company":"Acme","citation":"c1"}]"#)),
            Ok(json!({"id": "x", "choices": []})),
        ]);
        let session = AnalysisSession::new(transport, config());
        session.analyze("c1").await.unwrap();

        let analysis = session.analyze("c1").await.unwrap();
        assert!(!analysis.has_findings());
        assert_eq!(analysis.highlight, HighlightOutcome::NoCriticisms);
        assert_eq!(analysis.summary, SummaryOutcome::NoCriticisms);
        assert_eq!(analysis.diagnostics.len(), 1);
        assert!(session.current_records().is_empty());
    }

    #[tokio::test]
    async fn test_second_analysis_while_busy_is_rejected() {
        let session = AnalysisSession::new(PendingTransport, config());

        let mut first = Box::pin(session.analyze("Acme polluted"));
        // Drive the first call up to the transport suspension point
        assert!(poll_once(first.as_mut()).await.is_none());
        assert!(session.is_busy());

        let err = session.analyze("Acme polluted").await.unwrap_err();
        assert!(matches!(err, NewsRiskError::AnalysisInProgress));

        drop(first);
        assert!(!session.is_busy());
    }

    async fn poll_once<F: std::future::Future>(
        fut: std::pin::Pin<&mut F>,
    ) -> Option<F::Output> {
        use std::task::Poll;
        let mut fut = Some(fut);
        std::future::poll_fn(move |cx| {
            let f = fut.take().expect("polled once");
            match f.poll(cx) {
                Poll::Ready(out) => Poll::Ready(Some(out)),
                Poll::Pending => Poll::Ready(None),
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_records_carry_over_to_rebuilt_session() {
        let transport = CannedTransport::new(vec![Ok(envelope(
            r#"[{"company":"Acme","citation":"c1","criticized_by":"EPA"}]"#,
        ))]);
        let session = AnalysisSession::new(transport, config());
        session.analyze("c1").await.unwrap();

        let mut changed = config();
        changed.colors.company = "orange".to_string();
        let rebuilt = AnalysisSession::new(CannedTransport::new(Vec::new()), changed)
            .with_records(session.current_records());

        assert_eq!(rebuilt.config().colors.company, "orange");
        assert_eq!(
            &*rebuilt.current_records(),
            &[ExtractionRecord::new("Acme", "c1", "EPA")]
        );
    }

    #[test]
    fn test_from_reply_with_plain_content() {
        let analysis = Analysis::from_reply(
            "Acme polluted the river.",
            &ModelReply::from("company: Acme\ncitation: Acme polluted the river"),
        );
        assert_eq!(analysis.strategy, Some(ParseStrategy::KeyValue));
        assert!(analysis.summary_html().contains("company-tag\">Acme<"));
    }
}
