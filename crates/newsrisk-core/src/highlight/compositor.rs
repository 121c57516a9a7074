//! Interval-set span composition.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::document::HighlightedDocument;
use super::{HighlightKind, HighlightSpan};
use crate::escape::literal_regex;

/// Accumulates well-formed highlight spans over one text.
///
/// A new span is either disjoint from, nested in, equal to, or enclosing
/// each existing one. Spans never cross: a citation occurrence that would
/// cross existing spans is split at their boundaries into adjacent
/// fragments, and a crossing name occurrence is left plain.
#[derive(Debug, Clone)]
pub struct SpanCompositor<'a> {
    text: &'a str,
    spans: Vec<HighlightSpan>,
}

impl<'a> SpanCompositor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            spans: Vec::new(),
        }
    }

    /// The text being highlighted.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Spans placed so far, in insertion order.
    pub fn spans(&self) -> &[HighlightSpan] {
        &self.spans
    }

    /// Wrap every literal occurrence of `needle` as `kind`.
    ///
    /// Returns the number of spans added or retagged; a split citation
    /// counts once per fragment. An empty needle is ignored.
    pub fn wrap(&mut self, kind: HighlightKind, needle: &str) -> usize {
        if needle.trim().is_empty() {
            return 0;
        }
        let Some(pattern) = literal_regex(needle, kind.case_insensitive()) else {
            return 0;
        };

        let mut placed = 0;
        let mut pos = 0;
        while pos < self.text.len() {
            let Some(m) = pattern.find_at(self.text, pos) else {
                break;
            };
            let candidate = HighlightSpan {
                kind,
                start: m.start(),
                end: m.end(),
            };

            let cuts = self.crossing_bounds(&candidate);
            if cuts.is_empty() {
                placed += usize::from(self.place(candidate));
                pos = m.end();
            } else if kind == HighlightKind::Citation {
                debug!(
                    "Splitting citation at {}..{} into {} fragments",
                    candidate.start,
                    candidate.end,
                    cuts.len() + 1
                );
                placed += fragments(&candidate, &cuts)
                    .filter(|fragment| self.place(*fragment))
                    .count();
                pos = m.end();
            } else {
                // Retry from the next character; a shorter overlap may fit
                pos = next_char_boundary(self.text, m.start());
            }
        }

        trace!("Wrapped {} x {:?} for {:?}", placed, kind, needle);
        placed
    }

    /// Fold the spans into a nested document.
    pub fn into_document(self) -> HighlightedDocument {
        HighlightedDocument::build(self.text, self.spans)
    }

    /// Boundaries of existing spans that cross `candidate`, strictly inside it.
    ///
    /// Existing spans never cross each other, so cutting the candidate at
    /// these points leaves fragments that cross nothing.
    fn crossing_bounds(&self, candidate: &HighlightSpan) -> BTreeSet<usize> {
        self.spans
            .iter()
            .filter(|s| s.crosses(candidate))
            .flat_map(|s| [s.start, s.end])
            .filter(|&b| candidate.start < b && b < candidate.end)
            .collect()
    }

    fn place(&mut self, candidate: HighlightSpan) -> bool {
        let same_range = |s: &HighlightSpan| s.start == candidate.start && s.end == candidate.end;

        if candidate.kind == HighlightKind::Citation {
            if self
                .spans
                .iter()
                .any(|s| s.kind == HighlightKind::Citation && same_range(s))
            {
                return false;
            }
        } else {
            // Names on an identical range: source outranks company
            if let Some(existing) = self
                .spans
                .iter_mut()
                .find(|s| s.kind != HighlightKind::Citation && same_range(&**s))
            {
                if candidate.kind == HighlightKind::Source && existing.kind == HighlightKind::Company {
                    existing.kind = HighlightKind::Source;
                    return true;
                }
                return false;
            }

            // A name already inside a longer name of the same kind stays plain
            if self
                .spans
                .iter()
                .any(|s| s.kind == candidate.kind && s.contains(&candidate))
            {
                return false;
            }
        }

        self.spans.push(candidate);
        true
    }
}

/// Adjacent pieces of `span` between consecutive cut points.
fn fragments<'s>(
    span: &'s HighlightSpan,
    cuts: &'s BTreeSet<usize>,
) -> impl Iterator<Item = HighlightSpan> + 's {
    let bounds: Vec<usize> = std::iter::once(span.start)
        .chain(cuts.iter().copied())
        .chain(std::iter::once(span.end))
        .collect();
    (0..bounds.len() - 1).map(move |i| HighlightSpan {
        kind: span.kind,
        start: bounds[i],
        end: bounds[i + 1],
    })
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    from + text[from..].chars().next().map_or(1, char::len_utf8)
}
