//! Regex patterns for reply salvage.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Paragraph separator: a line break, optional blanks, another line break
    pub static ref PARAGRAPH_BREAK: Regex = Regex::new(
        r"\r?\n[ \t]*\r?\n"
    ).unwrap();

    // Field salvage. Value is group 1 when quoted, group 2 when bare.
    pub static ref COMPANY_FIELD: Regex = Regex::new(
        r#"(?i)"?company(?:_name)?"?\s*:\s*(?:"([^"]*)"|([^",\n}\]]+))"#
    ).unwrap();

    pub static ref CITATION_FIELD: Regex = Regex::new(
        r#"(?i)"?citation"?\s*:\s*(?:"([^"]*)"|([^",\n}\]]+))"#
    ).unwrap();

    pub static ref CRITICIZED_BY_FIELD: Regex = Regex::new(
        r#"(?i)"?criticized(?:_by|\s+by)"?\s*:\s*(?:"([^"]*)"|([^",\n}\]]*))"#
    ).unwrap();
}

/// All values captured by a salvage pattern, in content order.
pub fn field_values(pattern: &Regex, content: &str) -> Vec<String> {
    pattern
        .captures_iter(content)
        .map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_company_field_variants() {
        let content = r#"{"company": "Acme", "company_name":"Beta Ltd", Company: Gamma Inc}"#;
        assert_eq!(
            field_values(&COMPANY_FIELD, content),
            vec!["Acme", "Beta Ltd", "Gamma Inc"]
        );
    }

    #[test]
    fn test_criticized_by_allows_empty_and_spaced_key() {
        let content = "\"criticized_by\": \"\", criticized by: \"EPA\"";
        assert_eq!(field_values(&CRITICIZED_BY_FIELD, content), vec!["", "EPA"]);
    }

    #[test]
    fn test_paragraph_break_tolerates_blank_whitespace() {
        let parts: Vec<&str> = PARAGRAPH_BREAK.split("a\n\nb\n  \nc\r\n\r\nd").collect();
        assert_eq!(parts, vec!["a", "b", "c", "d"]);
    }
}
