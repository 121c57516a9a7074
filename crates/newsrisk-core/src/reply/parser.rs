//! Fallback-chain reply parser.
//!
//! Model replies are only loosely shaped by the prompt. The parser tries, in
//! order, a bracket-bounded JSON array, the whole content as JSON, `Key: value`
//! paragraphs, and finally a field-by-field regex scan. The first step that
//! produces records wins; steps are never merged.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::patterns::{
    CITATION_FIELD, COMPANY_FIELD, CRITICIZED_BY_FIELD, PARAGRAPH_BREAK, field_values,
};
use super::{ParseReport, ParseStrategy, ReplyParser};
use crate::models::record::ExtractionRecord;

const COMPANY_KEYS: &[&str] = &["company", "company_name"];
const CITATION_KEYS: &[&str] = &["citation"];
const CRITICIZED_BY_KEYS: &[&str] = &["criticized_by"];

/// Why a single strategy did not apply. Only ever reported as a diagnostic.
#[derive(Error, Debug)]
enum StrategyError {
    #[error("no ordered [ ... ] bounds in content")]
    NoBounds,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON value is not an array")]
    NotAnArray,

    #[error("no paragraph carried both a company and a citation")]
    NoParagraphRecords,

    #[error("no company/citation field pairs found")]
    NoSalvagedRecords,
}

/// Field a `Key: value` line assigns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordField {
    Company,
    Citation,
    CriticizedBy,
}

/// Reply parser running the four-step fallback chain.
#[derive(Debug, Clone)]
pub struct FallbackReplyParser {
    /// Whether the regex salvage step runs at all.
    salvage: bool,
}

impl Default for FallbackReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackReplyParser {
    /// Create a parser with every fallback step enabled.
    pub fn new() -> Self {
        Self { salvage: true }
    }

    /// Enable or disable the last-resort regex salvage step.
    pub fn with_salvage(mut self, salvage: bool) -> Self {
        self.salvage = salvage;
        self
    }

    fn parse_bounded_json(&self, content: &str) -> Result<Vec<ExtractionRecord>, StrategyError> {
        let start = content.find('[').ok_or(StrategyError::NoBounds)?;
        let end = content.rfind(']').ok_or(StrategyError::NoBounds)?;
        if end <= start {
            return Err(StrategyError::NoBounds);
        }

        let value: Value = serde_json::from_str(&content[start..=end])?;
        normalize_array(&value)
    }

    fn parse_whole_json(&self, content: &str) -> Result<Vec<ExtractionRecord>, StrategyError> {
        let value: Value = serde_json::from_str(content.trim())?;
        normalize_array(&value)
    }

    fn parse_key_value(&self, content: &str) -> Result<Vec<ExtractionRecord>, StrategyError> {
        let mut records = Vec::new();

        for paragraph in PARAGRAPH_BREAK.split(content) {
            if paragraph.trim().is_empty() {
                continue;
            }

            let mut current = PartialRecord::default();
            for line in paragraph.lines() {
                let Some((key, value)) = line.split_once(':') else {
                    continue;
                };
                let Some(field) = classify_key(key) else {
                    continue;
                };

                // A repeated key after a complete record starts the next one;
                // models sometimes drop the blank line between entries.
                if current.is_set(field) && current.is_complete() {
                    records.extend(current.take().finish());
                }
                current.set(field, clean_value(value));
            }
            records.extend(current.finish());
        }

        if records.is_empty() {
            Err(StrategyError::NoParagraphRecords)
        } else {
            Ok(records)
        }
    }

    fn parse_regex_salvage(&self, content: &str) -> Result<Vec<ExtractionRecord>, StrategyError> {
        let companies = field_values(&COMPANY_FIELD, content);
        let citations = field_values(&CITATION_FIELD, content);
        let sources = field_values(&CRITICIZED_BY_FIELD, content);

        debug!(
            "Regex salvage found {} companies, {} citations, {} sources",
            companies.len(),
            citations.len(),
            sources.len()
        );

        // Pair the i-th match of each pattern
        let records: Vec<ExtractionRecord> = companies
            .iter()
            .zip(citations.iter())
            .enumerate()
            .map(|(i, (company, citation))| {
                let source = sources.get(i).map(String::as_str).unwrap_or("");
                ExtractionRecord::new(company, citation, source)
            })
            .filter(ExtractionRecord::is_valid)
            .collect();

        if records.is_empty() {
            Err(StrategyError::NoSalvagedRecords)
        } else {
            Ok(records)
        }
    }
}

impl ReplyParser for FallbackReplyParser {
    fn parse_content(&self, content: &str) -> ParseReport {
        let mut diagnostics = Vec::new();

        debug!("Parsing reply content of {} bytes", content.len());

        // JSON steps: a parsed array is final even when empty
        match self.parse_bounded_json(content) {
            Ok(records) => return finish(records, ParseStrategy::BoundedJson, diagnostics),
            Err(e) => diagnostics.push(format!("bounded JSON: {}", e)),
        }
        match self.parse_whole_json(content) {
            Ok(records) => return finish(records, ParseStrategy::WholeJson, diagnostics),
            Err(e) => diagnostics.push(format!("whole JSON: {}", e)),
        }

        match self.parse_key_value(content) {
            Ok(records) => return finish(records, ParseStrategy::KeyValue, diagnostics),
            Err(e) => diagnostics.push(format!("key-value: {}", e)),
        }

        if self.salvage {
            match self.parse_regex_salvage(content) {
                Ok(records) => return finish(records, ParseStrategy::RegexSalvage, diagnostics),
                Err(e) => diagnostics.push(format!("regex salvage: {}", e)),
            }
        }

        warn!("No extraction records could be parsed from reply");
        for diagnostic in &diagnostics {
            debug!("  {}", diagnostic);
        }

        ParseReport {
            records: Vec::new(),
            strategy: None,
            diagnostics,
        }
    }
}

fn finish(
    records: Vec<ExtractionRecord>,
    strategy: ParseStrategy,
    diagnostics: Vec<String>,
) -> ParseReport {
    info!("Parsed {} records via {:?}", records.len(), strategy);
    ParseReport {
        records,
        strategy: Some(strategy),
        diagnostics,
    }
}

/// Normalize a JSON array of loosely keyed objects into records.
fn normalize_array(value: &Value) -> Result<Vec<ExtractionRecord>, StrategyError> {
    let items = value.as_array().ok_or(StrategyError::NotAnArray)?;

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let company = lookup(item, COMPANY_KEYS)?;
            let citation = lookup(item, CITATION_KEYS).unwrap_or_default();
            let source = lookup(item, CRITICIZED_BY_KEYS).unwrap_or_default();
            Some(ExtractionRecord::new(company, citation, source))
        })
        .filter(ExtractionRecord::is_valid)
        .collect())
}

/// First non-empty value whose key normalizes to one of `aliases`, in alias order.
fn lookup(item: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        item.iter()
            .filter(|(key, _)| normalize_key(key) == *alias)
            .find_map(|(_, value)| value_text(value))
    })
}

/// `"Criticized by"`, `criticized-by` and `CRITICIZED_BY` all become `criticized_by`.
fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn classify_key(raw: &str) -> Option<RecordField> {
    // Tolerate list bullets and markdown emphasis around the key
    let key = raw
        .trim()
        .trim_start_matches(['-', '*', '•'])
        .replace(['"', '\'', '*'], "")
        .trim()
        .to_lowercase();

    match key.as_str() {
        "company_name" | "company" => Some(RecordField::Company),
        "citation" | "criticism" => Some(RecordField::Citation),
        "criticized by" | "criticized_by" | "critics" => Some(RecordField::CriticizedBy),
        _ => None,
    }
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// A record being assembled from `Key: value` lines.
#[derive(Debug, Default)]
struct PartialRecord {
    company: Option<String>,
    citation: Option<String>,
    criticized_by: Option<String>,
}

impl PartialRecord {
    fn slot(&mut self, field: RecordField) -> &mut Option<String> {
        match field {
            RecordField::Company => &mut self.company,
            RecordField::Citation => &mut self.citation,
            RecordField::CriticizedBy => &mut self.criticized_by,
        }
    }

    fn set(&mut self, field: RecordField, value: String) {
        *self.slot(field) = Some(value);
    }

    fn is_set(&mut self, field: RecordField) -> bool {
        self.slot(field).is_some()
    }

    fn is_complete(&self) -> bool {
        self.company.as_deref().is_some_and(|c| !c.is_empty())
            && self.citation.as_deref().is_some_and(|c| !c.is_empty())
    }

    fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn finish(self) -> Option<ExtractionRecord> {
        let record = ExtractionRecord::new(
            self.company.unwrap_or_default(),
            self.citation.unwrap_or_default(),
            self.criticized_by.unwrap_or_default(),
        );
        record.is_valid().then_some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ModelReply;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(content: &str) -> ParseReport {
        FallbackReplyParser::new().parse_content(content)
    }

    fn acme() -> ExtractionRecord {
        ExtractionRecord::new("Acme", "Acme polluted the river", "EPA")
    }

    #[test]
    fn test_parse_json_array() {
        let report = parse(
            r#"[{"company":"Acme","citation":"Acme polluted the river","criticized_by":"EPA"}]"#,
        );
        assert_eq!(report.records, vec![acme()]);
        assert_eq!(report.strategy, Some(ParseStrategy::BoundedJson));
    }

    #[test]
    fn test_parse_key_value_equivalent() {
        let report = parse("company_name: Acme\ncitation: Acme polluted the river\ncriticized by: EPA");
        assert_eq!(report.records, vec![acme()]);
        assert_eq!(report.strategy, Some(ParseStrategy::KeyValue));
    }

    #[test]
    fn test_parse_json_inside_prose_and_fences() {
        let content = "Here are the findings:\n```json\n[\n  {\n    \"company_name\": \"Beta Ltd\",\n    \"Citation\": \"Beta Ltd ignored safety rules\",\n    \"Criticized by\": \"OSHA\"\n  }\n]\n```\nLet me know if you need more.";
        let report = parse(content);
        assert_eq!(
            report.records,
            vec![ExtractionRecord::new("Beta Ltd", "Beta Ltd ignored safety rules", "OSHA")]
        );
        assert_eq!(report.strategy, Some(ParseStrategy::BoundedJson));
    }

    #[test]
    fn test_empty_array_is_final() {
        let report = parse("[]");
        assert!(report.records.is_empty());
        assert_eq!(report.strategy, Some(ParseStrategy::BoundedJson));
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let report = parse("###garbage###");
        assert!(report.records.is_empty());
        assert_eq!(report.strategy, None);
        assert_eq!(report.diagnostics.len(), 4);
    }

    #[test]
    fn test_json_drops_items_without_company_or_citation() {
        let report = parse(
            r#"[
                {"company": "Acme", "citation": "c1"},
                {"citation": "orphan"},
                {"company": "", "company_name": "Beta", "citation": "c2", "criticized_by": null},
                {"company": "Gamma", "citation": "  "},
                "not an object",
                42
            ]"#,
        );
        assert_eq!(
            report.records,
            vec![
                ExtractionRecord::new("Acme", "c1", ""),
                ExtractionRecord::new("Beta", "c2", ""),
            ]
        );
    }

    #[test]
    fn test_unordered_brackets_fall_through() {
        let report = parse("company: Acme\ncitation: Acme lied about ] and [");
        assert_eq!(
            report.records,
            vec![ExtractionRecord::new("Acme", "Acme lied about ] and [", "")]
        );
        assert_eq!(report.strategy, Some(ParseStrategy::KeyValue));
    }

    #[test]
    fn test_whole_json_fallback() {
        let records = FallbackReplyParser::new()
            .parse_whole_json(r#" [{"company":"Acme","citation":"c1","criticized_by":"EPA"}] "#)
            .unwrap();
        assert_eq!(records, vec![ExtractionRecord::new("Acme", "c1", "EPA")]);
        assert!(FallbackReplyParser::new().parse_whole_json(r#"{"company":"Acme"}"#).is_err());
    }

    #[test]
    fn test_key_value_paragraphs() {
        let content = "Company: Acme\nCriticism: \"Acme dumped waste\",\nCritics: Greenpeace\n\n\
                       - **Company_Name**: Beta\n- **Citation**: Beta underpaid workers\n\n\
                       Company: Lonely Corp\n";
        let report = parse(content);
        assert_eq!(
            report.records,
            vec![
                ExtractionRecord::new("Acme", "Acme dumped waste", "Greenpeace"),
                ExtractionRecord::new("Beta", "Beta underpaid workers", ""),
            ]
        );
    }

    #[test]
    fn test_key_value_keeps_colons_in_value() {
        let report = parse("company: Acme\ncitation: The mayor said: Acme must pay");
        assert_eq!(report.records[0].citation, "The mayor said: Acme must pay");
    }

    #[test]
    fn test_key_value_splits_entries_without_blank_line() {
        let content = "company: Acme\ncitation: c1\ncompany: Beta\ncitation: c2\ncriticized_by: EPA";
        let report = parse(content);
        assert_eq!(
            report.records,
            vec![
                ExtractionRecord::new("Acme", "c1", ""),
                ExtractionRecord::new("Beta", "c2", "EPA"),
            ]
        );
    }

    #[test]
    fn test_regex_salvage_pairs_positionally() {
        // Truncated JSON: no closing bracket and no line-per-key layout
        let content = r#"[{"company": "Acme", "citation": "c1", "criticized_by": "EPA"}, {"company": "Beta", "citation": "c2", "criticized_by": ""}, {"company": "Gamma", "citat"#;
        let report = parse(content);
        assert_eq!(
            report.records,
            vec![
                ExtractionRecord::new("Acme", "c1", "EPA"),
                ExtractionRecord::new("Beta", "c2", ""),
            ]
        );
        assert_eq!(report.strategy, Some(ParseStrategy::RegexSalvage));
    }

    #[test]
    fn test_salvage_can_be_disabled() {
        let content = r#"{"company": "Acme", "citation": "c1""#;
        assert_eq!(parse(content).records.len(), 1);
        let report = FallbackReplyParser::new()
            .with_salvage(false)
            .parse_content(content);
        assert!(report.records.is_empty());
    }

    #[test]
    fn test_missing_source_defaults_to_empty_on_every_path() {
        let json = parse(r#"[{"company":"Acme","citation":"c1"}]"#);
        let whole = FallbackReplyParser::new()
            .parse_whole_json(r#"[{"company":"Acme","citation":"c1"}]"#)
            .unwrap();
        let kv = parse("company: Acme\ncitation: c1");
        let salvage = parse(r#"{"company": "Acme", "citation": "c1""#);

        for records in [json.records, whole, kv.records, salvage.records] {
            assert_eq!(records, vec![ExtractionRecord::new("Acme", "c1", "")]);
            assert_eq!(records[0].criticized_by, "");
        }
    }

    #[test]
    fn test_values_keep_case_keys_do_not() {
        let report = parse(r#"[{"COMPANY": "aCMe GmbH", "CITATION": "aCMe GmbH Lied"}]"#);
        assert_eq!(report.records[0].company, "aCMe GmbH");
        assert_eq!(report.records[0].citation, "aCMe GmbH Lied");
    }

    #[test]
    fn test_parse_reply_envelope() {
        let reply = ModelReply::from(json!({
            "choices": [{"message": {"content": "[{\"company\":\"Acme\",\"citation\":\"c1\"}]"}}]
        }));
        let report = FallbackReplyParser::new().parse_reply(&reply);
        assert_eq!(report.records, vec![ExtractionRecord::new("Acme", "c1", "")]);
    }

    #[test]
    fn test_parse_reply_malformed_envelope_is_empty() {
        let reply = ModelReply::from(json!({"error": "nope"}));
        let report = FallbackReplyParser::new().parse_reply(&reply);
        assert!(report.is_empty());
        assert_eq!(report.strategy, None);
        assert!(report.diagnostics[0].contains("malformed response"));
    }
}
