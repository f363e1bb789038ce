//! Scene execution: one renderer invocation per selected test.

use regrade_core::{ExecutionResult, SelectedTest};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::pool::WorkerPool;
use crate::renderer::Renderer;

/// Render one scene into `output_dir`.
///
/// Never fails: a crash, timeout or missing file only means the result is
/// not produced. The renderer's exit code does not decide anything.
pub async fn run_scene(
    renderer: &dyn Renderer,
    test: SelectedTest,
    output_dir: &Path,
) -> ExecutionResult {
    let start = Instant::now();
    let output_path = output_dir.join(test.output_file_name());

    info!(scene = %test.id, "Starting scene");
    let status = renderer.render(&test, &output_path).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let produced = output_path.is_file();

    if produced {
        info!(scene = %test.id, duration_ms, "Finished scene");
    } else {
        warn!(scene = %test.id, status = ?status, "Renderer produced no output");
    }

    ExecutionResult {
        test,
        output_path,
        produced,
        status,
        duration_ms,
    }
}

/// Render every test with at most `jobs` renderers at once.
///
/// Results are in the order of `tests`. Scenes still running or queued when
/// `shutdown` resolves are recorded as cancelled.
pub async fn run_batch<S>(
    renderer: Arc<dyn Renderer>,
    tests: Vec<SelectedTest>,
    output_dir: &Path,
    jobs: usize,
    shutdown: S,
) -> Vec<ExecutionResult>
where
    S: Future,
{
    let pool = WorkerPool::new(jobs);
    let dir = output_dir.to_path_buf();
    let slots = pool
        .run(
            tests.clone(),
            move |test| {
                let renderer = Arc::clone(&renderer);
                let dir = dir.clone();
                async move { run_scene(renderer.as_ref(), test, &dir).await }
            },
            shutdown,
        )
        .await;

    tests
        .into_iter()
        .zip(slots)
        .map(|(test, slot)| {
            slot.unwrap_or_else(|| {
                let output_path = output_dir.join(test.output_file_name());
                ExecutionResult::cancelled(test, output_path)
            })
        })
        .collect()
}
