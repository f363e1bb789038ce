//! HTML rendering of a [`ReportDocument`].

use std::path::Path;
use tracing::info;

use super::{Cell, ReportDocument, Section};
use crate::domain::{RegradeError, Result};

/// Prologue used when no custom header is supplied. Ends with an open `<body>`.
pub const DEFAULT_HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Regrade report</title>
<style>
body { font-family: sans-serif; margin: 1em 2em; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 4px; text-align: center; vertical-align: middle; }
img { max-width: 100%; }
td.score { font-size: 1.4em; font-weight: bold; }
</style>
</head>
<body>
"#;

/// Relative widths of the five report columns.
const COLUMN_WIDTHS: [u8; 5] = [15, 25, 25, 25, 10];

/// Escape HTML entities for safe embedding.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the document after `header`, closing the body and html elements.
pub fn render_html(doc: &ReportDocument, header: &str) -> String {
    let mut out = String::from(header);
    out.push_str(&format!("<h2>{}</h2>\n", escape_html(&doc.title)));
    for section in &doc.sections {
        render_section(&mut out, section);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn render_section(out: &mut String, section: &Section) {
    out.push_str(&format!("<h3>{}</h3>\n", escape_html(&section.heading)));
    out.push_str("<table style=\"width:100%\">\n<tr>");
    for column in &section.columns {
        out.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    out.push_str("</tr>\n");

    for row in &section.rows {
        out.push_str("<tr>\n");
        for (i, cell) in row.cells.iter().enumerate() {
            let width = COLUMN_WIDTHS.get(i).copied().unwrap_or(10);
            match cell {
                Cell::Text { text } => {
                    out.push_str(&format!(
                        "<td style=\"width:{width}%\">{}</td>\n",
                        escape_html(text)
                    ));
                }
                Cell::Image { src } => {
                    out.push_str(&format!(
                        "<td style=\"width:{width}%\"><img src=\"{}\"></td>\n",
                        escape_html(src)
                    ));
                }
                Cell::Score { value } => {
                    out.push_str(&format!(
                        "<td class=\"score\" style=\"width:{width}%\"><label>{value}</label></td>\n"
                    ));
                }
                Cell::Empty => {
                    out.push_str(&format!("<td style=\"width:{width}%\"></td>\n"));
                }
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Persist rendered HTML. Failure here is fatal for the run.
pub fn write_report(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).map_err(|source| RegradeError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Saved report");
    Ok(())
}
