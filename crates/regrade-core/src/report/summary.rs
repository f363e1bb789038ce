//! Machine-readable run summary written next to the HTML report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::domain::{
    ExecutionResult, ReferenceConvention, RegradeError, RenderStatus, Result, ScoreRecord,
};

/// Per-scene entry of the summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneSummary {
    pub id: String,
    pub category: String,
    pub produced: bool,
    pub status: RenderStatus,
    pub duration_ms: u64,
    pub score: u8,
    pub output_path: Option<PathBuf>,
    pub reference_path: PathBuf,
    pub reference: Option<ReferenceConvention>,
    pub diff_path: Option<PathBuf>,
}

/// Summary of one run. Scores are per scene only; nothing is aggregated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub renderer: PathBuf,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub scenes: Vec<SceneSummary>,
}

impl RunSummary {
    /// Pair execution results with their score records (same order).
    pub fn new(config: &RunConfig, results: &[ExecutionResult], records: &[ScoreRecord]) -> Self {
        let scenes = results
            .iter()
            .zip(records)
            .map(|(result, record)| SceneSummary {
                id: record.test.id.clone(),
                category: record.category().to_string(),
                produced: result.produced,
                status: result.status.clone(),
                duration_ms: result.duration_ms,
                score: record.score,
                output_path: record.output_path.clone(),
                reference_path: record.reference_path.clone(),
                reference: record.reference,
                diff_path: record.diff_path.clone(),
            })
            .collect();

        Self {
            run_id: config.run_id,
            started_at: config.started_at.with_timezone(&Utc),
            renderer: config.renderer.clone(),
            output_dir: config.output_dir(),
            report_path: config.report_path(),
            scenes,
        }
    }

    pub fn produced_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.produced).count()
    }

    /// Write the summary as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|source| RegradeError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
