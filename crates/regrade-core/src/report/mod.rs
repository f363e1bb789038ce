//! Report building.
//!
//! Scored records are grouped by category into a [`ReportDocument`]
//! (sections → rows → cells). Rendering to HTML lives in [`html`], the
//! machine-readable run summary in [`summary`].

pub mod html;
pub mod summary;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::ScoreRecord;

pub use html::{escape_html, render_html, write_report, DEFAULT_HEADER};
pub use summary::{RunSummary, SceneSummary};

/// Column headings of every category table.
pub const COLUMNS: [&str; 5] = ["Scene", "Correct", "Yours", "Difference", "Score"];

/// One table cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Text { text: String },
    /// Image referenced relative to the report.
    Image { src: String },
    Score { value: u8 },
    Empty,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// One category's table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub category: String,
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }
}

/// Produce a path relative to the report directory, with forward slashes.
/// Falls back to the path as given when no relative form exists.
pub fn path_for_report(report_dir: &Path, target: &Path) -> String {
    let path = pathdiff::diff_paths(target, report_dir).unwrap_or_else(|| target.to_path_buf());
    let rendered = path.display().to_string();
    if cfg!(windows) {
        rendered.replace('\\', "/")
    } else {
        rendered
    }
}

/// Group records by category, keeping first-seen category order and the
/// original order within each category.
pub fn group_by_category(records: &[ScoreRecord]) -> Vec<(String, Vec<&ScoreRecord>)> {
    let mut groups: Vec<(String, Vec<&ScoreRecord>)> = Vec::new();
    for record in records {
        let category = record.category();
        match groups.iter_mut().find(|(name, _)| name == category) {
            Some((_, members)) => members.push(record),
            None => groups.push((category.to_string(), vec![record])),
        }
    }
    groups
}

/// Build the report document. Image sources are relative to `report_dir`.
pub fn build_report(records: &[ScoreRecord], report_dir: &Path, title: &str) -> ReportDocument {
    let sections = group_by_category(records)
        .into_iter()
        .map(|(category, members)| Section {
            heading: format!("{category} tests"),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: members
                .into_iter()
                .map(|record| build_row(record, report_dir))
                .collect(),
            category,
        })
        .collect();

    ReportDocument {
        title: title.to_string(),
        sections,
    }
}

fn build_row(record: &ScoreRecord, report_dir: &Path) -> Row {
    let image = |path: &Path| Cell::Image {
        src: path_for_report(report_dir, path),
    };

    let produced = match &record.output_path {
        Some(path) => image(path),
        None => Cell::text("no output"),
    };
    let diff = match &record.diff_path {
        Some(path) => image(path),
        None => Cell::Empty,
    };

    Row {
        cells: vec![
            Cell::text(record.test.id.clone()),
            image(&record.reference_path),
            produced,
            diff,
            Cell::Score {
                value: record.score,
            },
        ],
    }
}
