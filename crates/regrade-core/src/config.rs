//! Run configuration and output-location allocation.
//!
//! A [`RunConfig`] is built once per run and handed to every stage. It is
//! the only place run-wide names (output directory, report, summary) are
//! derived, so no stage reads the clock or invents paths of its own.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::domain::{RegradeError, Result};

/// Prefix of every run directory name.
pub const RUN_DIR_PREFIX: &str = "regrade";

/// Reference images directory name under the output root when not configured.
pub const DEFAULT_REFERENCE_DIR: &str = "reference_images";

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;

/// Size of the frame the renderer is asked to produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

/// Everything a run needs to know, fixed at construction.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,

    /// Renderer executable under test.
    pub renderer: PathBuf,

    /// Directory holding `<id>.json` scene specs.
    pub examples_dir: PathBuf,

    /// Directory holding trusted reference images. Never written to.
    pub reference_dir: PathBuf,

    /// Directory the run directory and report are created in.
    pub output_root: PathBuf,

    pub viewport: Viewport,

    /// Per-scene render timeout; zero disables it.
    pub render_timeout: Duration,

    /// Maximum concurrent renderer processes.
    pub jobs: usize,
}

impl RunConfig {
    /// Create a configuration for a new run, validating the input paths.
    ///
    /// `reference_dir` defaults to `<output_root>/reference_images`.
    pub fn new(
        renderer: PathBuf,
        examples_dir: PathBuf,
        output_root: PathBuf,
        reference_dir: Option<PathBuf>,
    ) -> Result<Self> {
        require_exists("renderer executable", &renderer)?;
        require_exists("examples directory", &examples_dir)?;
        require_exists("output root", &output_root)?;

        let reference_dir =
            reference_dir.unwrap_or_else(|| output_root.join(DEFAULT_REFERENCE_DIR));

        Ok(Self {
            run_id: Uuid::new_v4(),
            started_at: Local::now(),
            renderer,
            examples_dir,
            reference_dir,
            output_root,
            viewport: Viewport::default(),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            jobs: default_jobs(),
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Name shared by the run directory, report and summary.
    pub fn run_name(&self) -> String {
        let simple = self.run_id.simple().to_string();
        format!(
            "{}-{}-{}",
            RUN_DIR_PREFIX,
            self.started_at.format("%Y-%m-%d at %H-%M-%S"),
            &simple[..8]
        )
    }

    /// Directory holding produced frames and diff images.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.run_name())
    }

    /// HTML report, a sibling of [`Self::output_dir`].
    pub fn report_path(&self) -> PathBuf {
        self.output_root.join(format!("{}.html", self.run_name()))
    }

    /// JSON summary, a sibling of [`Self::output_dir`].
    pub fn summary_path(&self) -> PathBuf {
        self.output_root.join(format!("{}.json", self.run_name()))
    }

    /// Create the run directory.
    ///
    /// Fails with [`RegradeError::OutputExists`] if the directory or the
    /// report already exist; nothing from an earlier run is overwritten.
    pub fn allocate_output(&self) -> Result<PathBuf> {
        let dir = self.output_dir();
        let report = self.report_path();
        if report.exists() {
            return Err(RegradeError::OutputExists { path: report });
        }
        match std::fs::create_dir(&dir) {
            Ok(()) => {
                info!(path = %dir.display(), run_id = %self.run_id, "Allocated run output");
                Ok(dir)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(RegradeError::OutputExists { path: dir })
            }
            Err(e) => Err(RegradeError::Io(e)),
        }
    }
}

fn require_exists(what: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(RegradeError::MissingPath {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Worker count matching the available hardware parallelism.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(root: &TempDir) -> RunConfig {
        let renderer = root.path().join("renderer");
        std::fs::write(&renderer, b"").expect("write renderer");
        let examples = root.path().join("scenes");
        std::fs::create_dir_all(&examples).expect("mkdir scenes");
        RunConfig::new(renderer, examples, root.path().to_path_buf(), None).expect("config")
    }

    #[test]
    fn test_missing_renderer_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        let err = RunConfig::new(
            root.path().join("nope"),
            root.path().to_path_buf(),
            root.path().to_path_buf(),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RegradeError::MissingPath {
                what: "renderer executable",
                ..
            }
        ));
    }

    #[test]
    fn test_derived_paths_are_siblings() {
        let root = TempDir::new().expect("tempdir");
        let config = config_in(&root);

        let dir = config.output_dir();
        assert_eq!(dir.parent(), Some(root.path()));
        assert_eq!(config.report_path().parent(), Some(root.path()));
        assert_eq!(
            config.report_path().file_stem().map(|s| s.to_os_string()),
            dir.file_name().map(|s| s.to_os_string())
        );
        assert!(config.run_name().starts_with("regrade-"));
        assert_eq!(
            config.reference_dir,
            root.path().join(DEFAULT_REFERENCE_DIR)
        );
    }

    #[test]
    fn test_allocate_twice_fails_loudly() {
        let root = TempDir::new().expect("tempdir");
        let config = config_in(&root);

        let dir = config.allocate_output().expect("first allocation");
        assert!(dir.is_dir());

        let err = config.allocate_output().unwrap_err();
        assert!(matches!(err, RegradeError::OutputExists { .. }));
    }

    #[test]
    fn test_existing_report_blocks_allocation() {
        let root = TempDir::new().expect("tempdir");
        let config = config_in(&root);
        std::fs::write(config.report_path(), "old report").expect("write");

        let err = config.allocate_output().unwrap_err();
        assert!(matches!(err, RegradeError::OutputExists { .. }));
        assert!(!config.output_dir().exists());
    }

    #[test]
    fn test_two_runs_get_distinct_locations() {
        let root = TempDir::new().expect("tempdir");
        let first = config_in(&root);
        let second = config_in(&root);

        let a = first.allocate_output().expect("first");
        let b = second.allocate_output().expect("second");
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
    }

    #[test]
    fn test_jobs_floor_is_one() {
        let root = TempDir::new().expect("tempdir");
        let config = config_in(&root).with_jobs(0);
        assert_eq!(config.jobs, 1);
        assert!(default_jobs() >= 1);
    }
}
