//! Output formatting for TODO reports, diagnostics and search results

use baseline_core::{Diagnostic, IconKey, PickCandidate, TodoReport, TodoRow};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Shown instead of an empty report
pub const EMPTY_REPORT: &str = "No items found";

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(alias = "md")]
    Markdown,
    Html,
}

/// Render a TODO report in the specified format
pub fn render_todos(report: &TodoReport, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Markdown => render_markdown(report),
        OutputFormat::Html => render_html(report),
    })
}

fn status_text(row: &TodoRow) -> String {
    match &row.feature {
        Some(f) => {
            let label = match f.icon {
                IconKey::Widely => f.status_label.green().to_string(),
                IconKey::Newly => f.status_label.cyan().to_string(),
                IconKey::Limited => f.status_label.yellow().to_string(),
            };
            format!("{} - {}", f.name.bold(), label)
        }
        None => "unknown feature".red().to_string(),
    }
}

fn render_text(report: &TodoReport) -> String {
    if report.is_empty() {
        return format!("{}\n", EMPTY_REPORT.dimmed());
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{} Baseline TODOs ({})\n\n",
        "##".bold(),
        report.len()
    ));

    for row in &report.rows {
        output.push_str(&format!(
            "{} {}:{}\n    {}\n",
            row.feature_id.yellow(),
            row.file_path,
            row.line_number,
            status_text(row)
        ));

        let supported: Vec<String> = row
            .support
            .iter()
            .filter_map(|cell| {
                cell.version
                    .as_ref()
                    .map(|v| format!("{} {}", cell.browser_name, v))
            })
            .collect();
        if !supported.is_empty() {
            output.push_str(&format!("    {}\n", supported.join(", ").dimmed()));
        }
    }

    let unknown = report.unknown().count();
    if unknown > 0 {
        output.push_str(&format!(
            "\n{} {} TODO(s) reference unknown features\n",
            "!".red().bold(),
            unknown
        ));
    }

    output
}

fn support_summary(row: &TodoRow) -> String {
    row.support
        .iter()
        .map(|cell| match &cell.version {
            Some(v) => format!("{} {}", cell.browser_name, v),
            None => format!("{} {}", cell.browser_name, baseline_core::UNSUPPORTED_CELL),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_markdown(report: &TodoReport) -> String {
    let mut output = String::from("# Baseline TODOs\n\n");

    if report.is_empty() {
        output.push_str(&format!("_{}_\n", EMPTY_REPORT));
        return output;
    }

    output.push_str("| Feature | Status | Location | Support |\n");
    output.push_str("| --- | --- | --- | --- |\n");
    for row in &report.rows {
        let status = match &row.feature {
            Some(f) => format!("{} ({})", f.status_label, f.name.replace('|', "\\|")),
            None => "Unknown feature".to_string(),
        };
        output.push_str(&format!(
            "| `{}` | {} | [{}:{}]({}) | {} |\n",
            row.feature_id,
            status,
            row.file_name,
            row.line_number,
            row.file_uri,
            support_summary(row)
        ));
    }

    output
}

fn render_html(report: &TodoReport) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    output.push_str("<meta charset=\"utf-8\">\n");
    output.push_str("<title>Baseline TODOs</title>\n");
    output.push_str("<style>\n");
    output.push_str("body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }\n");
    output.push_str("table { border-collapse: collapse; width: 100%; }\n");
    output.push_str("td, th { border-bottom: 1px solid #ddd; padding: 0.4rem; text-align: left; }\n");
    output.push_str(".widely { color: green; }\n");
    output.push_str(".newly { color: steelblue; }\n");
    output.push_str(".limited { color: orange; }\n");
    output.push_str(".unknown { color: red; }\n");
    output.push_str("</style>\n");
    output.push_str("</head>\n<body>\n");
    output.push_str("<h1>Baseline TODOs</h1>\n");

    if report.is_empty() {
        output.push_str(&format!("<p>{}</p>\n", EMPTY_REPORT));
        output.push_str("</body>\n</html>\n");
        return output;
    }

    output.push_str("<table>\n<tr><th>Feature</th><th>Status</th><th>Location</th><th>Support</th></tr>\n");
    for row in &report.rows {
        let (class, status) = match &row.feature {
            Some(f) => (
                f.icon.as_str(),
                format!("{} ({})", html_escape(&f.status_label), html_escape(&f.name)),
            ),
            None => ("unknown", "Unknown feature".to_string()),
        };
        output.push_str(&format!(
            "<tr><td><code>{}</code></td><td class=\"{}\">{}</td><td><a href=\"{}#L{}\">{}:{}</a></td><td>{}</td></tr>\n",
            html_escape(&row.feature_id),
            class,
            status,
            html_escape(&row.file_uri),
            row.line_number,
            html_escape(&row.file_name),
            row.line_number,
            html_escape(&support_summary(row))
        ));
    }
    output.push_str("</table>\n");

    output.push_str("</body>\n</html>\n");
    output
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Render diagnostics for one file, compiler style. Lines and columns are
/// printed 1-based.
pub fn render_diagnostics(path: &Path, text: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    let lines: Vec<&str> = text.lines().collect();

    for d in diagnostics {
        let line = d.range.start.line as usize;
        let headline = d.message.lines().next().unwrap_or_default();
        output.push_str(&format!(
            "{}[{}]: {}\n  {} {}:{}:{}\n",
            "error".red().bold(),
            d.code,
            headline.bold(),
            "-->".blue(),
            path.display(),
            line + 1,
            d.range.start.character + 1
        ));
        if let Some(source) = lines.get(line) {
            output.push_str(&format!("   {} {}\n", "|".blue(), source));
        }
    }

    output
}

/// Render search hits, best first
pub fn render_candidates(candidates: &[PickCandidate], limit: usize) -> String {
    if candidates.is_empty() {
        return format!("{}\n", EMPTY_REPORT.dimmed());
    }

    let mut output = String::new();
    for c in candidates.iter().take(limit) {
        output.push_str(&format!(
            "{} {}\n    {}\n    {}\n",
            c.id.cyan().bold(),
            c.name,
            c.status_label.dimmed(),
            c.description
        ));
    }
    if candidates.len() > limit {
        output.push_str(&format!(
            "{}\n",
            format!("... and {} more", candidates.len() - limit).dimmed()
        ));
    }
    output
}
