//! WASM bindings for ESG news criticism analysis.
//!
//! This crate provides WebAssembly bindings for the browser-extension front
//! end: reply parsing, highlighting and summaries as plain functions, and an
//! `Analyzer` class that owns a session against the OpenAI API.

use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use newsrisk_core::{
    Analysis, AnalysisSession, ExtensionSettings, ExtractionRecord, FallbackReplyParser,
    HighlightColors, ModelId, ModelReply, NewsRiskConfig, OpenAiTransport, ReplyParser,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Serialize with plain objects for maps, so tagged enums come out as
/// ordinary JS objects.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_error)
}

fn records_from_js(records: JsValue) -> Result<Vec<ExtractionRecord>, JsValue> {
    serde_wasm_bindgen::from_value(records).map_err(js_error)
}

/// Settings object from extension storage; `undefined` means defaults.
fn config_from_js(settings: JsValue) -> Result<NewsRiskConfig, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(NewsRiskConfig::default());
    }
    let settings: ExtensionSettings = serde_wasm_bindgen::from_value(settings).map_err(js_error)?;
    Ok(settings.into())
}

fn colors_from_js(settings: JsValue) -> Result<HighlightColors, JsValue> {
    Ok(config_from_js(settings)?.colors)
}

/// A string is taken as message content, anything else as the raw envelope.
fn reply_from_js(reply: JsValue) -> Result<ModelReply, JsValue> {
    match reply.as_string() {
        Some(content) => Ok(ModelReply::Content(content)),
        None => {
            let envelope: serde_json::Value =
                serde_wasm_bindgen::from_value(reply).map_err(js_error)?;
            Ok(ModelReply::Envelope(envelope))
        }
    }
}

/// Parse a model reply into extraction records.
///
/// Returns `{records, strategy, diagnostics}`. Never throws on unparseable
/// content; `records` is empty instead.
#[wasm_bindgen(js_name = parseReply)]
pub fn parse_reply(reply: JsValue) -> Result<JsValue, JsValue> {
    let report = FallbackReplyParser::new().parse_reply(&reply_from_js(reply)?);
    to_js(&report)
}

/// Highlight records within text as a tree of nested regions.
#[wasm_bindgen]
pub fn highlight(text: &str, records: JsValue) -> Result<JsValue, JsValue> {
    let records = records_from_js(records)?;
    to_js(&newsrisk_core::highlight(text, &records))
}

/// Highlight records within text as HTML.
#[wasm_bindgen(js_name = highlightHtml)]
pub fn highlight_html(text: &str, records: JsValue, settings: JsValue) -> Result<String, JsValue> {
    let records = records_from_js(records)?;
    let colors = colors_from_js(settings)?;
    Ok(newsrisk_core::highlight_html(
        &newsrisk_core::highlight(text, &records),
        &colors,
    ))
}

/// Group records by company.
#[wasm_bindgen]
pub fn summarize(records: JsValue) -> Result<JsValue, JsValue> {
    let records = records_from_js(records)?;
    to_js(&newsrisk_core::summarize(&records))
}

/// Per-company summary as HTML.
#[wasm_bindgen(js_name = summaryHtml)]
pub fn summary_html(records: JsValue) -> Result<String, JsValue> {
    let records = records_from_js(records)?;
    Ok(newsrisk_core::summary_html(&newsrisk_core::summarize(&records)))
}

/// Standalone "save as HTML" page for the given text and records.
#[wasm_bindgen(js_name = reportHtml)]
pub fn report_html(text: &str, records: JsValue, settings: JsValue) -> Result<String, JsValue> {
    let records = records_from_js(records)?;
    let colors = colors_from_js(settings)?;
    Ok(newsrisk_core::report_html(
        &newsrisk_core::highlight(text, &records),
        &newsrisk_core::summarize(&records),
        &colors,
        chrono::Local::now().naive_local(),
    ))
}

/// Download file name for a report saved now.
#[wasm_bindgen(js_name = reportFileName)]
pub fn report_file_name() -> String {
    newsrisk_core::report_file_name(chrono::Local::now().naive_local())
}

/// Escape text for literal use in a regular expression.
#[wasm_bindgen(js_name = escapePattern)]
pub fn escape_pattern(text: &str) -> String {
    newsrisk_core::escape_pattern(text)
}

/// The fixed analysis instruction.
#[wasm_bindgen(js_name = promptText)]
pub fn prompt_text() -> String {
    newsrisk_core::prompt::analysis_prompt().to_string()
}

#[derive(Serialize)]
struct ModelOption {
    id: &'static str,
    name: &'static str,
}

/// Supported models as `[{id, name}]`, recommended first.
#[wasm_bindgen(js_name = supportedModels)]
pub fn supported_models() -> Result<JsValue, JsValue> {
    let models: Vec<ModelOption> = ModelId::ALL
        .iter()
        .map(|m| ModelOption {
            id: m.as_str(),
            name: m.display_name(),
        })
        .collect();
    to_js(&models)
}

/// Analysis plus its rendered HTML, as handed to the panel.
#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    #[serde(flatten)]
    analysis: &'a Analysis,
    #[serde(rename = "highlightHtml")]
    highlight_html: String,
    #[serde(rename = "summaryHtml")]
    summary_html: String,
}

/// Analysis session for browser use.
#[wasm_bindgen]
pub struct Analyzer {
    session: Rc<AnalysisSession<OpenAiTransport>>,
}

fn new_session(config: NewsRiskConfig) -> Result<AnalysisSession<OpenAiTransport>, JsValue> {
    let transport = OpenAiTransport::with_options(
        config.api.api_key.clone(),
        config.api.base_url.clone(),
        config.api.timeout(),
    )
    .map_err(js_error)?;
    Ok(AnalysisSession::new(transport, config))
}

#[wasm_bindgen]
impl Analyzer {
    /// Create an analyzer from the extension settings object.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<Analyzer, JsValue> {
        Ok(Self {
            session: Rc::new(new_session(config_from_js(settings)?)?),
        })
    }

    /// Replace the settings, keeping the records of the last analysis.
    /// Fails while an analysis is in flight.
    #[wasm_bindgen(js_name = setSettings)]
    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        if self.session.is_busy() {
            return Err(js_error(newsrisk_core::NewsRiskError::AnalysisInProgress));
        }
        let session = new_session(config_from_js(settings)?)?
            .with_records(self.session.current_records());
        self.session = Rc::new(session);
        Ok(())
    }

    /// Current settings in the extension's shape.
    #[wasm_bindgen]
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        to_js(&ExtensionSettings::from(self.session.config().clone()))
    }

    /// Whether an analysis is outstanding; the UI disables its trigger meanwhile.
    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    /// Records of the last successful analysis.
    #[wasm_bindgen(js_name = currentRecords)]
    pub fn current_records(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.session.current_records())
    }

    /// Analyze text; resolves to the analysis with `highlightHtml` and
    /// `summaryHtml`, rejects with the error message.
    #[wasm_bindgen]
    pub fn analyze(&self, text: String) -> js_sys::Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let analysis = session.analyze(&text).await.map_err(|e| {
                web_sys::console::warn_1(&JsValue::from_str(&format!("Analysis failed: {}", e)));
                js_error(e)
            })?;

            let colors = &session.config().colors;
            to_js(&AnalyzeOutput {
                analysis: &analysis,
                highlight_html: analysis.highlight_html(colors),
                summary_html: analysis.summary_html(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn records() -> JsValue {
        serde_wasm_bindgen::to_value(&vec![ExtractionRecord::new(
            "Acme",
            "Acme polluted the river",
            "EPA",
        )])
        .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_escape_pattern() {
        assert_eq!(escape_pattern("A+B (Co.)"), r"A\+B \(Co\.\)");
    }

    #[wasm_bindgen_test]
    fn test_parse_reply_from_string() {
        let report = parse_reply(JsValue::from_str(
            r#"[{"company":"Acme","citation":"Acme polluted the river"}]"#,
        ))
        .unwrap();
        let report: newsrisk_core::ParseReport = serde_wasm_bindgen::from_value(report).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].criticized_by, "");
    }

    #[wasm_bindgen_test]
    fn test_highlight_html_with_default_colors() {
        let html = highlight_html(
            "Acme polluted the river, said EPA.",
            records(),
            JsValue::UNDEFINED,
        )
        .unwrap();
        assert!(html.contains("citation-highlight"));
        assert!(html.contains("background-color: #d4edda;"));
    }

    #[wasm_bindgen_test]
    fn test_summary_html_and_models() {
        assert!(summary_html(records()).unwrap().contains("company-tag"));
        assert!(supported_models().unwrap().is_object());
        assert!(prompt_text().contains("criticized_by"));
    }

    #[wasm_bindgen_test]
    fn test_set_settings_keeps_records() {
        let session = new_session(NewsRiskConfig::default())
            .unwrap()
            .with_records(vec![ExtractionRecord::new("Acme", "c1", "EPA")]);
        let mut analyzer = Analyzer {
            session: Rc::new(session),
        };

        let settings = serde_wasm_bindgen::to_value(&ExtensionSettings {
            company_color: "orange".to_string(),
            ..ExtensionSettings::default()
        })
        .unwrap();
        analyzer.set_settings(settings).unwrap();

        assert_eq!(analyzer.session.config().colors.company, "orange");
        assert_eq!(analyzer.session.current_records().len(), 1);
    }

    #[wasm_bindgen_test]
    fn test_analyzer_requires_api_key() {
        let analyzer = Analyzer::new(JsValue::UNDEFINED).unwrap();
        assert!(!analyzer.is_busy());
        assert!(analyzer.settings().unwrap().is_object());
    }
}
