//! Span highlighting of extraction records over the source text.
//!
//! Highlights are computed as an interval set over the original string and
//! then folded into a tree of nested regions. Nothing here produces markup
//! directly; see [`crate::render`] for HTML.

mod compositor;
pub(crate) mod document;

pub use compositor::SpanCompositor;
pub use document::{HighlightedDocument, Node};

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::HighlightColors;
use crate::models::record::ExtractionRecord;

/// Role of a highlighted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Citation,
    Company,
    Source,
}

impl HighlightKind {
    /// Nesting precedence for regions covering the same range; lower is outer.
    pub fn rank(&self) -> u8 {
        match self {
            HighlightKind::Citation => 0,
            HighlightKind::Company => 1,
            HighlightKind::Source => 2,
        }
    }

    /// Short tag name, used by [`HighlightedDocument::to_markup`].
    pub fn tag(&self) -> &'static str {
        match self {
            HighlightKind::Citation => "citation",
            HighlightKind::Company => "company",
            HighlightKind::Source => "source",
        }
    }

    /// CSS class used by the HTML renderers.
    pub fn css_class(&self) -> &'static str {
        match self {
            HighlightKind::Citation => "citation-highlight",
            HighlightKind::Company => "company-highlight",
            HighlightKind::Source => "source-highlight",
        }
    }

    /// Background color for this kind.
    pub fn color<'a>(&self, colors: &'a HighlightColors) -> &'a str {
        match self {
            HighlightKind::Citation => &colors.criticism,
            HighlightKind::Company => &colors.company,
            HighlightKind::Source => &colors.source,
        }
    }

    /// Whether matching for this kind ignores case.
    pub fn case_insensitive(&self) -> bool {
        !matches!(self, HighlightKind::Citation)
    }
}

/// A highlighted byte range of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub kind: HighlightKind,
    /// Byte offset of the first highlighted character.
    pub start: usize,
    /// Byte offset one past the last highlighted character.
    pub end: usize,
}

impl HighlightSpan {
    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &HighlightSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the spans share characters without one containing the other.
    pub fn crosses(&self, other: &HighlightSpan) -> bool {
        let overlap = self.start < other.end && other.start < self.end;
        overlap && !self.contains(other) && !other.contains(self)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Result of highlighting a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HighlightOutcome {
    /// No record carried a citation; there is nothing to show.
    NoCriticisms,
    /// The highlighted text.
    Document(HighlightedDocument),
}

impl HighlightOutcome {
    /// The document, if any criticism was found.
    pub fn document(&self) -> Option<&HighlightedDocument> {
        match self {
            HighlightOutcome::NoCriticisms => None,
            HighlightOutcome::Document(document) => Some(document),
        }
    }
}

/// Highlight citations, companies and sources of `records` within `text`.
///
/// Citations are wrapped first, longest first and case-sensitively; a
/// citation partly overlapping one already placed is split into adjacent
/// fragments. Company names and then source names follow, case-insensitively,
/// nesting inside or around existing regions without ever crossing their
/// boundaries. A name that is both a company and a source ends up tagged as a
/// source.
pub fn highlight(text: &str, records: &[ExtractionRecord]) -> HighlightOutcome {
    if !records.iter().any(|r| !r.citation.trim().is_empty()) {
        debug!("No citations among {} records", records.len());
        return HighlightOutcome::NoCriticisms;
    }

    // Longest citation first; stable, so equal lengths keep reply order
    let mut ordered: Vec<&ExtractionRecord> = records.iter().collect();
    ordered.sort_by_key(|r| Reverse(r.citation.chars().count()));

    let mut compositor = SpanCompositor::new(text);

    for citation in distinct(ordered.iter().map(|r| r.citation.as_str()), false) {
        compositor.wrap(HighlightKind::Citation, citation);
    }
    for company in names(ordered.iter().map(|r| r.company.as_str())) {
        compositor.wrap(HighlightKind::Company, company);
    }
    for source in names(ordered.iter().map(|r| r.criticized_by.as_str())) {
        compositor.wrap(HighlightKind::Source, source);
    }

    HighlightOutcome::Document(compositor.into_document())
}

/// Non-empty values in first-seen order, deduplicated exactly or ignoring case.
fn distinct<'a>(values: impl Iterator<Item = &'a str>, ignore_case: bool) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.trim().is_empty())
        .filter(|v| {
            let key = if ignore_case {
                v.to_lowercase()
            } else {
                v.to_string()
            };
            seen.insert(key)
        })
        .collect()
}

/// Distinct names, longest first, so a longer name is claimed before any
/// shorter name it contains.
fn names<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut names = distinct(values, true);
    names.sort_by_key(|n| Reverse(n.chars().count()));
    names
}
