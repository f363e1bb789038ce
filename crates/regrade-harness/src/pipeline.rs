//! Run orchestration: select, render, score, report.

use anyhow::Context;
use regrade_core::report::{build_report, render_html, write_report, RunSummary};
use regrade_core::{
    select, Catalog, ExecutionResult, ImageComparator, RunConfig, ScoreRecord, Scorer, Selection,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::renderer::Renderer;
use crate::runner::run_batch;

/// Everything a finished run left behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub summary_path: PathBuf,

    /// Execution results in selection order.
    pub results: Vec<ExecutionResult>,

    /// Score records in selection order.
    pub records: Vec<ScoreRecord>,

    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn produced_count(&self) -> usize {
        self.results.iter().filter(|r| r.produced).count()
    }
}

/// Run orchestrator.
pub struct RunPipeline;

impl RunPipeline {
    /// Execute one grading run.
    ///
    /// Only configuration problems (the output location already exists) and
    /// report persistence failures are errors. Scenes that fail to render or
    /// compare score zero and the run carries on.
    pub async fn run<S>(
        config: &RunConfig,
        catalog: &Catalog,
        selection: &Selection,
        renderer: Arc<dyn Renderer>,
        comparator: Arc<dyn ImageComparator>,
        header: &str,
        shutdown: S,
    ) -> anyhow::Result<RunOutcome>
    where
        S: Future,
    {
        let start = Instant::now();

        let tests = select(catalog, selection, &config.examples_dir);
        if tests.is_empty() {
            warn!("No scenes selected; the report will be empty");
        }
        info!(run_id = %config.run_id, scenes = tests.len(), jobs = config.jobs, "Starting run");

        let output_dir = config
            .allocate_output()
            .context("Failed to allocate run output")?;

        let results = run_batch(renderer, tests, &output_dir, config.jobs, shutdown).await;

        // Scoring decodes images; keep it off the async workers.
        let reference_dir = config.reference_dir.clone();
        let score_dir = output_dir.clone();
        let (results, records) = tokio::task::spawn_blocking(move || {
            let scorer = Scorer::new(&reference_dir, &score_dir, comparator.as_ref());
            let records = scorer.score_all(&results);
            (results, records)
        })
        .await
        .context("Scoring task failed")?;

        for record in &records {
            info!(scene = %record.test.id, score = record.score, "Scored scene");
        }

        let report_path = config.report_path();
        let report_dir = report_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.output_root.clone());
        let document = build_report(&records, &report_dir, &config.run_name());
        write_report(&report_path, &render_html(&document, header))?;

        let summary_path = config.summary_path();
        RunSummary::new(config, &results, &records)
            .write(&summary_path)
            .context("Failed to write run summary")?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %config.run_id,
            duration_ms,
            report = %report_path.display(),
            "Run complete"
        );

        Ok(RunOutcome {
            output_dir,
            report_path,
            summary_path,
            results,
            records,
            duration_ms,
        })
    }
}
