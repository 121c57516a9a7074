//! Literal pattern escaping for span matching.

use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Characters with a meaning in pattern syntax outside character classes.
const PATTERN_SPECIALS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Escape `text` so that, used as a pattern, it matches only itself.
///
/// Each special character is prefixed with a backslash; everything else
/// (including multi-byte characters) passes through untouched.
pub fn escape_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if PATTERN_SPECIALS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compile a regex matching the literal `needle`.
///
/// Returns `None` for an empty needle; an empty pattern would match between
/// every character.
pub fn literal_regex(needle: &str, case_insensitive: bool) -> Option<Regex> {
    if needle.is_empty() {
        return None;
    }

    match RegexBuilder::new(&escape_pattern(needle))
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!("Could not compile literal pattern for {:?}: {}", needle, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn literal_positions(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
        haystack
            .match_indices(needle)
            .map(|(start, m)| (start, start + m.len()))
            .collect()
    }

    fn regex_positions(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
        literal_regex(needle, false)
            .unwrap()
            .find_iter(haystack)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn test_escape_pattern_specials() {
        assert_eq!(escape_pattern("A+B (Co.)"), r"A\+B \(Co\.\)");
        assert_eq!(escape_pattern("$5 [x]|{y}^?*\\"), r"\$5 \[x\]\|\{y\}\^\?\*\\");
        assert_eq!(escape_pattern("plain text"), "plain text");
    }

    #[test]
    fn test_escaped_pattern_matches_only_literal_occurrences() {
        let haystack = "A+B (Co.) sued AAB (Co.). A+B (Co.) appealed; AB Co was silent.";
        let needle = "A+B (Co.)";
        assert_eq!(regex_positions(haystack, needle), literal_positions(haystack, needle));
        assert_eq!(regex_positions(haystack, needle).len(), 2);
    }

    #[test]
    fn test_escaped_pattern_with_backslashes_and_anchors() {
        for needle in ["^start$", r"C:\data\", "a.b*c", "x{2}", "[citation]"] {
            let haystack = format!("before {needle} middle {needle}{needle} after");
            assert_eq!(
                regex_positions(&haystack, needle),
                literal_positions(&haystack, needle),
                "needle {:?}",
                needle
            );
        }
    }

    #[test]
    fn test_multibyte_needle() {
        let haystack = "トヨタ自動車は批判された。トヨタ自動車は否定した。";
        assert_eq!(
            regex_positions(haystack, "トヨタ自動車"),
            literal_positions(haystack, "トヨタ自動車")
        );
    }

    #[test]
    fn test_case_insensitive_literal() {
        let regex = literal_regex("acme corp.", true).unwrap();
        assert!(regex.is_match("ACME Corp."));
        assert!(!regex.is_match("ACME Corpx"));
    }

    #[test]
    fn test_empty_needle_has_no_regex() {
        assert!(literal_regex("", false).is_none());
    }
}
