//! Nested highlight tree.

use serde::{Deserialize, Serialize};

use super::{HighlightKind, HighlightSpan};

/// A node of the highlighted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Plain text without line breaks.
    Text { text: String },
    /// An explicit line break.
    LineBreak,
    /// A highlighted region.
    Highlight {
        kind: HighlightKind,
        children: Vec<Node>,
    },
}

/// Text with its highlights, both as a tree and as flat spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedDocument {
    /// Top-level nodes in text order.
    pub nodes: Vec<Node>,

    /// All spans sorted by start, outer before inner.
    pub spans: Vec<HighlightSpan>,
}

impl HighlightedDocument {
    /// Build the tree from well-formed spans over `text`.
    pub(crate) fn build(text: &str, mut spans: Vec<HighlightSpan>) -> Self {
        spans.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.kind.rank().cmp(&b.kind.rank()))
        });

        let mut next = 0;
        let nodes = build_nodes(text, &spans, 0, text.len(), &mut next);
        Self { nodes, spans }
    }

    /// Spans of one kind, in document order.
    pub fn spans_of(&self, kind: HighlightKind) -> impl Iterator<Item = &HighlightSpan> {
        self.spans.iter().filter(move |s| s.kind == kind)
    }

    /// Render with `<citation>`, `<company>` and `<source>` tags and literal
    /// newlines. Text is not escaped.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        walk(&self.nodes, &mut |event| match event {
            Event::Text(text) => out.push_str(text),
            Event::LineBreak => out.push('\n'),
            Event::Open(kind) => {
                out.push('<');
                out.push_str(kind.tag());
                out.push('>');
            }
            Event::Close(kind) => {
                out.push_str("</");
                out.push_str(kind.tag());
                out.push('>');
            }
        });
        out
    }

    /// The text without highlights, line breaks normalized to `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        walk(&self.nodes, &mut |event| match event {
            Event::Text(text) => out.push_str(text),
            Event::LineBreak => out.push('\n'),
            Event::Open(_) | Event::Close(_) => {}
        });
        out
    }
}

/// Flattened traversal event.
pub(crate) enum Event<'a> {
    Text(&'a str),
    LineBreak,
    Open(HighlightKind),
    Close(HighlightKind),
}

/// Depth-first traversal emitting open/close events around children.
pub(crate) fn walk<'a>(nodes: &'a [Node], visit: &mut impl FnMut(Event<'a>)) {
    for node in nodes {
        match node {
            Node::Text { text } => visit(Event::Text(text)),
            Node::LineBreak => visit(Event::LineBreak),
            Node::Highlight { kind, children } => {
                visit(Event::Open(*kind));
                walk(children, visit);
                visit(Event::Close(*kind));
            }
        }
    }
}

fn build_nodes(
    text: &str,
    spans: &[HighlightSpan],
    start: usize,
    end: usize,
    next: &mut usize,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut cursor = start;

    while let Some(span) = spans.get(*next).copied() {
        if span.start >= end {
            break;
        }
        *next += 1;

        push_text(&mut nodes, &text[cursor..span.start]);
        let children = build_nodes(text, spans, span.start, span.end, next);
        nodes.push(Node::Highlight {
            kind: span.kind,
            children,
        });
        cursor = span.end;
    }

    push_text(&mut nodes, &text[cursor..end]);
    nodes
}

/// Append `text`, turning each newline into a [`Node::LineBreak`].
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let has_break = lines.peek().is_some();
        let line = if has_break {
            line.strip_suffix('\r').unwrap_or(line)
        } else {
            line
        };

        if !line.is_empty() {
            nodes.push(Node::Text {
                text: line.to_string(),
            });
        }
        if has_break {
            nodes.push(Node::LineBreak);
        }
    }
}
