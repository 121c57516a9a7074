//! Terminal rendering of an analysis.

use console::{Style, style};

use newsrisk_core::{Analysis, HighlightKind, HighlightOutcome, Node, SummaryOutcome};

const NO_CRITICISMS: &str = "No criticisms found in the text.";

fn kind_style(kind: HighlightKind) -> Style {
    match kind {
        HighlightKind::Citation => Style::new().black().on_yellow(),
        HighlightKind::Company => Style::new().black().on_cyan().bold(),
        HighlightKind::Source => Style::new().black().on_green(),
    }
}

/// Highlighted text followed by the per-company summary.
pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", style("Highlighted text").bold().underlined()));
    match &analysis.highlight {
        HighlightOutcome::NoCriticisms => out.push_str(NO_CRITICISMS),
        HighlightOutcome::Document(document) => render_nodes(&document.nodes, None, &mut out),
    }
    out.push_str("\n\n");

    out.push_str(&format!("{}\n", style("Summary").bold().underlined()));
    match &analysis.summary {
        SummaryOutcome::NoCriticisms => {
            out.push_str(NO_CRITICISMS);
            out.push('\n');
        }
        SummaryOutcome::Groups(summary) => {
            for group in &summary.groups {
                out.push_str(&format!(
                    "{}\n",
                    style(format!("▸ {}", group.company)).bold().cyan()
                ));
                for entry in &group.entries {
                    out.push_str(&format!("    - Criticism: {}\n", or_na(&entry.citation)));
                    out.push_str(&format!("      Source:    {}\n", or_na(&entry.criticized_by)));
                }
            }
        }
    }

    out.push_str(&format!(
        "\n{} {}  {} {}  {} {}\n",
        kind_style(HighlightKind::Company).apply_to(" "),
        "Company",
        kind_style(HighlightKind::Citation).apply_to(" "),
        "Criticism",
        kind_style(HighlightKind::Source).apply_to(" "),
        "Source"
    ));
    out
}

/// Text takes the style of its innermost enclosing highlight.
fn render_nodes(nodes: &[Node], enclosing: Option<HighlightKind>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text } => match enclosing {
                Some(kind) => out.push_str(&kind_style(kind).apply_to(text).to_string()),
                None => out.push_str(text),
            },
            Node::LineBreak => out.push('\n'),
            Node::Highlight { kind, children } => render_nodes(children, Some(*kind), out),
        }
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsrisk_core::ModelReply;

    #[test]
    fn test_render_plain_when_colors_disabled() {
        console::set_colors_enabled(false);
        let analysis = Analysis::from_reply(
            "Acme dumped waste.\nThe EPA objected.",
            &ModelReply::from("company: Acme\ncitation: Acme dumped waste"),
        );

        let out = render_analysis(&analysis);
        assert!(out.contains("Acme dumped waste.\nThe EPA objected."));
        assert!(out.contains("▸ Acme"));
        assert!(out.contains("- Criticism: Acme dumped waste"));
        assert!(out.contains("Source:    N/A"));
    }

    #[test]
    fn test_render_no_criticisms() {
        console::set_colors_enabled(false);
        let analysis = Analysis::from_reply("Quiet day.", &ModelReply::from("[]"));
        let out = render_analysis(&analysis);
        assert_eq!(out.matches(NO_CRITICISMS).count(), 2);
    }
}
