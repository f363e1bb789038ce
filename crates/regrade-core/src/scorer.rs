//! Scoring: reference resolution, comparison, and reduction to `0..=100`.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::compare::ImageComparator;
use crate::domain::{ExecutionResult, ReferenceConvention, ScoreRecord};

/// Differences are multiplied by this before clamping, so a 10% mean
/// normalized difference already scores zero.
pub const PENALTY_AMPLIFICATION: f64 = 10.0;

/// Reduce a mean absolute channel difference (`0..=255`) to a score.
pub fn score_from_mean_abs_diff(mean_abs: f64) -> u8 {
    if !mean_abs.is_finite() {
        return 0;
    }
    let normalized = mean_abs.abs() / 255.0;
    let penalty = (normalized * PENALTY_AMPLIFICATION).clamp(0.0, 1.0);
    (100.0 * (1.0 - penalty)).round() as u8
}

/// A reference image that passed the existence and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub path: PathBuf,
    pub convention: ReferenceConvention,
}

/// Reference candidates for `id` that exist and match `produced_dims`, in
/// the order they should be tried.
pub fn usable_references(
    reference_dir: &Path,
    id: &str,
    produced_dims: (u32, u32),
) -> Vec<ResolvedReference> {
    ReferenceConvention::ALL
        .iter()
        .filter_map(|&convention| {
            let path = reference_dir.join(convention.file_name(id));
            match image::image_dimensions(&path) {
                Ok(dims) if dims == produced_dims => Some(ResolvedReference { path, convention }),
                Ok(dims) => {
                    debug!(
                        scene = id,
                        path = %path.display(),
                        reference = ?dims,
                        produced = ?produced_dims,
                        "Reference size does not match frame"
                    );
                    None
                }
                Err(_) => None,
            }
        })
        .collect()
}

/// First usable reference for `id`, if any.
pub fn resolve_reference(
    reference_dir: &Path,
    id: &str,
    produced_dims: (u32, u32),
) -> Option<ResolvedReference> {
    usable_references(reference_dir, id, produced_dims)
        .into_iter()
        .next()
}

/// Scores execution results against a reference directory.
pub struct Scorer<'a> {
    reference_dir: &'a Path,
    output_dir: &'a Path,
    comparator: &'a dyn ImageComparator,
}

impl<'a> Scorer<'a> {
    pub fn new(
        reference_dir: &'a Path,
        output_dir: &'a Path,
        comparator: &'a dyn ImageComparator,
    ) -> Self {
        Self {
            reference_dir,
            output_dir,
            comparator,
        }
    }

    /// Score one result. Never fails: anything unusable scores 0.
    pub fn score(&self, result: &ExecutionResult) -> ScoreRecord {
        let test = &result.test;
        let standard_reference = self
            .reference_dir
            .join(ReferenceConvention::Standard.file_name(&test.id));

        let unscored = |output_path: Option<PathBuf>| ScoreRecord {
            test: test.clone(),
            output_path,
            reference_path: standard_reference.clone(),
            reference: None,
            diff_path: None,
            score: 0,
        };

        if !result.produced {
            return unscored(None);
        }

        let produced_dims = match image::image_dimensions(&result.output_path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(scene = %test.id, error = %e, "Produced frame is unreadable");
                return unscored(Some(result.output_path.clone()));
            }
        };

        let candidates = usable_references(self.reference_dir, &test.id, produced_dims);
        if candidates.is_empty() {
            warn!(
                scene = %test.id,
                reference_dir = %self.reference_dir.display(),
                "No usable reference image"
            );
            return unscored(Some(result.output_path.clone()));
        }

        let diff_path = self.output_dir.join(test.diff_file_name());
        for candidate in candidates {
            match self
                .comparator
                .compare(&candidate.path, &result.output_path, &diff_path)
            {
                Ok(diff) => {
                    let score = score_from_mean_abs_diff(diff.mean_abs());
                    debug!(scene = %test.id, score, convention = ?candidate.convention, "Scored");
                    return ScoreRecord {
                        test: test.clone(),
                        output_path: Some(result.output_path.clone()),
                        reference_path: candidate.path,
                        reference: Some(candidate.convention),
                        diff_path: Some(diff_path),
                        score,
                    };
                }
                Err(e) => {
                    warn!(
                        scene = %test.id,
                        reference = %candidate.path.display(),
                        error = %e,
                        "Comparison failed"
                    );
                }
            }
        }

        unscored(Some(result.output_path.clone()))
    }

    /// Score every result, keeping the input order.
    pub fn score_all(&self, results: &[ExecutionResult]) -> Vec<ScoreRecord> {
        results.iter().map(|r| self.score(r)).collect()
    }
}
