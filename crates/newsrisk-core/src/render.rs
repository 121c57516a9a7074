//! HTML rendering of highlight and summary results.

use chrono::NaiveDateTime;

use crate::highlight::document::{Event, walk};
use crate::highlight::{HighlightKind, HighlightOutcome};
use crate::models::config::HighlightColors;
use crate::summary::SummaryOutcome;

/// Shown in place of an empty result.
pub const NO_CRITICISMS_HTML: &str = "<p>No criticisms found in the text.</p>";

const REPORT_TITLE: &str = "RepRisk News Analysis Results";

/// Escape text for use in HTML content and double-quoted attributes.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Highlighted text as inline-styled `<span>` regions with `<br>` line breaks.
pub fn highlight_html(outcome: &HighlightOutcome, colors: &HighlightColors) -> String {
    let Some(document) = outcome.document() else {
        return NO_CRITICISMS_HTML.to_string();
    };

    let mut out = String::new();
    walk(&document.nodes, &mut |event| match event {
        Event::Text(text) => out.push_str(&html_escape(text)),
        Event::LineBreak => out.push_str("<br>"),
        Event::Open(kind) => out.push_str(&format!(
            "<span class=\"{}\" style=\"background-color: {};\">",
            kind.css_class(),
            html_escape(kind.color(colors))
        )),
        Event::Close(_) => out.push_str("</span>"),
    });
    out
}

/// Per-company summary list. Empty values show as `N/A`.
pub fn summary_html(outcome: &SummaryOutcome) -> String {
    let Some(summary) = outcome.summary() else {
        return NO_CRITICISMS_HTML.to_string();
    };

    let mut out = String::new();
    for group in &summary.groups {
        out.push_str("<div class=\"company-summary\">\n");
        out.push_str(&format!(
            "  <div class=\"company-tag\">{}</div>\n",
            html_escape(&group.company)
        ));
        out.push_str("  <div class=\"company-details\">\n    <ul>\n");
        for entry in &group.entries {
            out.push_str(&format!(
                "      <li><strong>Criticism:</strong> {}<br><strong>Source:</strong> {}</li>\n",
                or_na(&entry.citation),
                or_na(&entry.criticized_by)
            ));
        }
        out.push_str("    </ul>\n  </div>\n</div>\n");
    }
    out
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        html_escape(value)
    }
}

/// A standalone HTML page with legend, highlighted text, summary and a
/// generation timestamp footer.
pub fn report_html(
    highlight: &HighlightOutcome,
    summary: &SummaryOutcome,
    colors: &HighlightColors,
    generated_at: NaiveDateTime,
) -> String {
    let legend: String = [
        (HighlightKind::Company, "Company"),
        (HighlightKind::Citation, "Criticism"),
        (HighlightKind::Source, "Source"),
    ]
    .iter()
    .map(|(kind, label)| {
        format!(
            "    <div class=\"legend-item\"><div class=\"legend-color\" style=\"background-color: {};\"></div><span>{}</span></div>\n",
            html_escape(kind.color(colors)),
            label
        )
    })
    .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }}
    h1 {{ border-bottom: 1px solid #eee; padding-bottom: 10px; }}
    .legend {{ display: flex; gap: 20px; margin-bottom: 20px; padding: 10px; background-color: #f8f9fa; border-radius: 5px; }}
    .legend-item {{ display: flex; align-items: center; gap: 5px; }}
    .legend-color {{ width: 16px; height: 16px; border-radius: 4px; }}
    .company-tag {{ font-weight: bold; margin-top: 10px; }}
    .footer {{ margin-top: 30px; font-size: 12px; color: #666; text-align: center; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <div class="legend">
{legend}  </div>
  <div class="analysis-result">
{body}
  </div>
  <div class="summary">
    <h2>Summary</h2>
{summary}  </div>
  <div class="footer">
    <p>Generated by RepRisk News Analyzer - {generated}</p>
  </div>
</body>
</html>
"#,
        title = REPORT_TITLE,
        legend = legend,
        body = highlight_html(highlight, colors),
        summary = summary_html(summary),
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// File name for a saved report, e.g. `RepRisk_Analysis_2024-05-01.html`.
pub fn report_file_name(generated_at: NaiveDateTime) -> String {
    format!("RepRisk_Analysis_{}.html", generated_at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::highlight;
    use crate::models::record::ExtractionRecord;
    use crate::summary::summarize;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_highlight_html_nests_spans_and_escapes() {
        let text = "<b>Acme</b> & co:\nAcme dumped waste";
        let records = [ExtractionRecord::new("Acme", "Acme dumped waste", "")];
        let html = highlight_html(&highlight(text, &records), &HighlightColors::default());

        assert_eq!(
            html,
            "&lt;b&gt;<span class=\"company-highlight\" style=\"background-color: #cce5ff;\">Acme</span>&lt;/b&gt; &amp; co:<br>\
             <span class=\"citation-highlight\" style=\"background-color: #fff3cd;\">\
             <span class=\"company-highlight\" style=\"background-color: #cce5ff;\">Acme</span> dumped waste</span>"
        );
    }

    #[test]
    fn test_no_criticisms_html() {
        let colors = HighlightColors::default();
        assert_eq!(highlight_html(&highlight("x", &[]), &colors), NO_CRITICISMS_HTML);
        assert_eq!(summary_html(&summarize(&[])), NO_CRITICISMS_HTML);
    }

    #[test]
    fn test_summary_html_uses_na_for_missing_source() {
        let records = [
            ExtractionRecord::new("Acme", "c1", ""),
            ExtractionRecord::new("Acme", "c2", "EPA"),
        ];
        let html = summary_html(&summarize(&records));

        assert_eq!(html.matches("company-tag").count(), 1);
        assert!(html.contains("<strong>Criticism:</strong> c1<br><strong>Source:</strong> N/A"));
        assert!(html.contains("<strong>Criticism:</strong> c2<br><strong>Source:</strong> EPA"));
        assert!(html.find("c1").unwrap() < html.find("c2").unwrap());
    }

    #[test]
    fn test_report_has_legend_body_and_footer() {
        let records = [ExtractionRecord::new("Acme", "Acme lied", "NGO")];
        let mut colors = HighlightColors::default();
        colors.source = "lightgreen".to_string();

        let report = report_html(
            &highlight("Acme lied, said NGO.", &records),
            &summarize(&records),
            &colors,
            timestamp(),
        );

        assert!(report.starts_with("<!DOCTYPE html>"));
        assert!(report.contains("background-color: lightgreen;\"></div><span>Source</span>"));
        assert!(report.contains("class=\"source-highlight\""));
        assert!(report.contains("Generated by RepRisk News Analyzer - 2024-05-01 09:30:00"));
        assert_eq!(report_file_name(timestamp()), "RepRisk_Analysis_2024-05-01.html");
    }
}
