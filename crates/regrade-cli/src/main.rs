//! Regrade - visual regression grading CLI
//!
//! The `regrade` command runs a renderer over the scene catalog, scores each
//! frame against its reference image and writes an HTML report.
//!
//! ```text
//! regrade ./build/viewer ./scenes --all-but-sampling --filter boombox
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use regrade_core::report::DEFAULT_HEADER;
use regrade_core::{
    Catalog, Inclusion, NeighborhoodComparator, RunConfig, Selection, Tag, Viewport,
};
use regrade_harness::{ExternalRenderer, RunOutcome, RunPipeline};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "regrade")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grade a renderer against reference images", long_about = None)]
struct Cli {
    /// Path to the renderer executable
    #[arg(value_parser = existing_path)]
    renderer: PathBuf,

    /// Directory containing the scene JSON files
    #[arg(value_parser = existing_path)]
    examples: PathBuf,

    /// Run every scene
    #[arg(long)]
    all: bool,

    /// Run every scene except those using environment-map sampling
    #[arg(long)]
    all_but_sampling: bool,

    /// Run PBR scenes lit by direct lights only
    #[arg(long)]
    pbr_direct: bool,

    /// Run PBR scenes with environment-map sampling
    #[arg(long)]
    pbr_sampling: bool,

    /// Run material-capture scenes
    #[arg(long)]
    matcap: bool,

    /// Run tangent-space normal mapping scenes
    #[arg(long)]
    normalmap: bool,

    /// Only keep selected scenes whose name contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Directory holding reference images (default: <output-root>/reference_images)
    #[arg(long, env = "REGRADE_REFERENCE_DIR")]
    reference_dir: Option<PathBuf>,

    /// Directory the run output and report are written into
    #[arg(long, env = "REGRADE_OUTPUT_ROOT", default_value = ".", value_parser = existing_path)]
    output_root: PathBuf,

    /// JSON scene catalog to use instead of the built-in one
    #[arg(long, env = "REGRADE_CATALOG")]
    catalog: Option<PathBuf>,

    /// HTML prologue placed before the report tables
    #[arg(long, value_parser = existing_path)]
    header: Option<PathBuf>,

    /// Maximum concurrent renderer processes (default: available parallelism)
    #[arg(short, long, env = "REGRADE_JOBS")]
    jobs: Option<usize>,

    /// Seconds before a renderer process is killed (0 disables)
    #[arg(long, env = "REGRADE_TIMEOUT_SECS", default_value_t = regrade_core::config::DEFAULT_RENDER_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Frame width passed to the renderer
    #[arg(long, default_value_t = 500)]
    width: u32,

    /// Frame height passed to the renderer
    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Neighborhood radius (pixels) the comparator searches for a match
    #[arg(long, default_value_t = 1)]
    radius: u32,

    /// Open the report in the system viewer when done
    #[arg(long)]
    open: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn selection(&self) -> Selection {
        let flags = [
            (self.all, Inclusion::All),
            (self.all_but_sampling, Inclusion::AllButSampling),
            (self.pbr_direct, Inclusion::HasTag(Tag::Direct)),
            (self.pbr_sampling, Inclusion::HasTag(Tag::Sampled)),
            (self.matcap, Inclusion::HasTag(Tag::Matcap)),
            (self.normalmap, Inclusion::HasTag(Tag::Normals)),
        ];
        let inclusions = flags
            .into_iter()
            .filter_map(|(set, inclusion)| set.then_some(inclusion))
            .collect();

        Selection {
            inclusions,
            filter: self.filter.clone(),
        }
    }
}

fn existing_path(raw: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path does not exist: {raw}"))
    }
}

/// Absolute form of `path` when it can be resolved, so report links are
/// computed between absolute paths.
fn absolute(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    regrade_core::init_tracing(cli.json, level);

    let selection = cli.selection();
    if selection.inclusions.is_empty() {
        warn!("No inclusion flag given; nothing will run (try --all)");
    }

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_json_file(path).context("Failed to load catalog")?,
        None => Catalog::builtin(),
    };

    let header = match &cli.header {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read header {}", path.display()))?,
        None => DEFAULT_HEADER.to_string(),
    };

    let output_root = absolute(cli.output_root.clone());
    let reference_dir = cli.reference_dir.clone().map(|dir| {
        if dir.is_relative() && !dir.exists() {
            output_root.join(dir)
        } else {
            absolute(dir)
        }
    });

    let mut config = RunConfig::new(
        absolute(cli.renderer.clone()),
        absolute(cli.examples.clone()),
        output_root,
        reference_dir,
    )
    .context("Invalid run configuration")?
    .with_viewport(Viewport {
        width: cli.width,
        height: cli.height,
    })
    .with_render_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(jobs) = cli.jobs {
        config = config.with_jobs(jobs);
    }

    println!("{}", config.output_dir().display());
    if !config.reference_dir.is_dir() {
        warn!(
            path = %config.reference_dir.display(),
            "Reference directory not found; every scene will score 0"
        );
    }

    let renderer = Arc::new(ExternalRenderer::from_config(&config));
    let comparator = Arc::new(NeighborhoodComparator::with_radius(cli.radius));
    let shutdown = watch_interrupts(tokio::signal::ctrl_c, || std::process::exit(130));

    let outcome = RunPipeline::run(
        &config,
        &catalog,
        &selection,
        renderer,
        comparator,
        &header,
        shutdown,
    )
    .await
    .context("Grading run failed")?;

    print_outcome(&outcome);

    if cli.open {
        open_report(&outcome.report_path);
    }

    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    println!();
    for record in &outcome.records {
        println!("  {:>3}  {}", record.score, record.test.id);
    }
    println!();
    println!(
        "Produced: {}/{} scenes in {}ms",
        outcome.produced_count(),
        outcome.results.len(),
        outcome.duration_ms
    );
    println!("Saved: {}", outcome.report_path.display());
}

/// Watch for interrupts for the rest of the run.
///
/// The returned future resolves on the first interrupt, which cancels any
/// renders still in flight; scoring and the report still complete. A second
/// interrupt, at any later stage, calls `on_abort`. If the signal source
/// fails the future never resolves.
fn watch_interrupts<F, Fut, A>(mut next_signal: F, on_abort: A) -> impl Future<Output = ()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<()>> + Send,
    A: FnOnce() + Send + 'static,
{
    let (tx, mut rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = next_signal().await {
            warn!(error = %e, "Could not listen for interrupts");
            return;
        }
        warn!("Interrupted; cancelling renders (interrupt again to abort)");
        let _ = tx.send(true);
        if next_signal().await.is_ok() {
            warn!("Interrupted again; aborting run");
            on_abort();
        }
    });

    async move {
        if rx.wait_for(|&stop| stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Hand the report to the platform viewer. Failure is only a warning.
fn open_report(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(windows) {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        std::process::Command::new("xdg-open")
    };

    match command.arg(path).spawn() {
        Ok(_) => info!(path = %path.display(), "Opened report"),
        Err(e) => warn!(error = %e, "Could not open report viewer"),
    }
}
