//! Per-run records produced by the pipeline stages.
//!
//! Each stage produces a fresh record from the previous one; none of them is
//! mutated after construction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::scene::SelectedTest;

/// How a renderer invocation ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderStatus {
    /// The process exited; `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
    /// The process exceeded the render timeout and was killed.
    TimedOut { after_secs: u64 },
    /// The process could not be started.
    SpawnFailed { reason: String },
    /// The batch was interrupted before this scene finished.
    Cancelled,
}

/// Outcome of running the renderer for one test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub test: SelectedTest,

    /// Where the renderer was told to write its frame.
    pub output_path: PathBuf,

    /// True iff the output file exists after the invocation.
    pub produced: bool,

    pub status: RenderStatus,

    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Record for a scene that never got to finish.
    pub fn cancelled(test: SelectedTest, output_path: PathBuf) -> Self {
        Self {
            test,
            output_path,
            produced: false,
            status: RenderStatus::Cancelled,
            duration_ms: 0,
        }
    }
}

/// Naming convention used to find a reference image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceConvention {
    /// `<id>.png`
    Standard,
    /// `<id>@2x.png`
    HighRes,
}

impl ReferenceConvention {
    /// Conventions in the order they are tried.
    pub const ALL: [ReferenceConvention; 2] =
        [ReferenceConvention::Standard, ReferenceConvention::HighRes];

    pub fn file_name(&self, id: &str) -> String {
        match self {
            ReferenceConvention::Standard => format!("{id}.png"),
            ReferenceConvention::HighRes => format!("{id}@2x.png"),
        }
    }
}

/// Score for one test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub test: SelectedTest,

    /// Produced frame, `None` when the renderer wrote nothing.
    pub output_path: Option<PathBuf>,

    /// Reference image shown next to the frame.
    pub reference_path: PathBuf,

    /// Convention the reference was resolved with, if any was usable.
    pub reference: Option<ReferenceConvention>,

    /// Visualised difference image, present only when a comparison ran.
    pub diff_path: Option<PathBuf>,

    /// Similarity in `0..=100`; 100 means identical.
    pub score: u8,
}

impl ScoreRecord {
    pub fn category(&self) -> &str {
        self.test.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_file_names() {
        assert_eq!(
            ReferenceConvention::Standard.file_name("pbr_earth"),
            "pbr_earth.png"
        );
        assert_eq!(
            ReferenceConvention::HighRes.file_name("pbr_earth"),
            "pbr_earth@2x.png"
        );
    }

    #[test]
    fn test_cancelled_is_not_produced() {
        let test = SelectedTest {
            id: "matcap_head".to_string(),
            spec_path: PathBuf::from("matcap_head.json"),
        };
        let result = ExecutionResult::cancelled(test, PathBuf::from("out/matcap_head.png"));
        assert!(!result.produced);
        assert_eq!(result.status, RenderStatus::Cancelled);
    }

    #[test]
    fn test_render_status_serde_tagged() {
        let status = RenderStatus::TimedOut { after_secs: 30 };
        let v = serde_json::to_value(&status).expect("to_value");
        assert_eq!(v["kind"], "timed_out");
        assert_eq!(v["after_secs"], 30);
    }
}
