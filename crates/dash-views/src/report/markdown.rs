//! Markdown rendering of an analysis report

use dash_core::Report;
use std::fmt::Write;

/// Table cells cannot hold pipes or line breaks
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("_None recorded._\n");
        return;
    }
    for item in items {
        let _ = writeln!(out, "- {}", item.replace('\n', " "));
    }
}

/// Render `report` with the fixed dashboard template
pub fn to_markdown(report: &Report) -> String {
    let analysis = &report.analysis;
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", report.name);
    let _ = writeln!(out, "_Generated {}_\n", report.date);

    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "{}\n", analysis.summary.trim());

    out.push_str("## Key Statistics\n\n");
    if analysis.statistics.is_empty() {
        out.push_str("_None recorded._\n");
    } else {
        out.push_str("| Metric | Value |\n| --- | --- |\n");
        for stat in &analysis.statistics {
            let _ = writeln!(out, "| {} | {} |", cell(&stat.label), cell(&stat.value.to_string()));
        }
    }

    out.push_str("\n## Insights\n\n");
    bullets(&mut out, &analysis.insights);

    out.push_str("\n## Performance Pulse\n\n### Strengths\n\n");
    bullets(&mut out, &analysis.performance_pulse.strengths);
    out.push_str("\n### Risks\n\n");
    bullets(&mut out, &analysis.performance_pulse.risks);
    out
}
