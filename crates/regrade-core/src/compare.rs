//! Image comparison contract and the bundled neighborhood comparator.
//!
//! A comparator turns a (reference, candidate) pair into a per-channel
//! absolute difference array and writes a visualisation of it. Scoring only
//! depends on the array, never on how it was computed.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Channels per pixel in a [`DiffImage`].
pub const DIFF_CHANNELS: usize = 3;

/// Errors a comparator can report. The scorer never propagates them.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("image not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error(
        "dimension mismatch: reference {}x{}, candidate {}x{}",
        reference.0, reference.1, candidate.0, candidate.1
    )]
    DimensionMismatch {
        reference: (u32, u32),
        candidate: (u32, u32),
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write diff image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Per-channel absolute differences, row-major, [`DIFF_CHANNELS`] per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DiffImage {
    /// Wrap raw difference values; `None` if the length does not fit.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * DIFF_CHANNELS;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Mean of all difference values, in `[0, 255]`. Empty arrays count as 0.
    pub fn mean_abs(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let total: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        total as f64 / self.data.len() as f64
    }
}

/// Anything that can compare a produced frame against a reference.
pub trait ImageComparator: Send + Sync {
    /// Compare `candidate` with `reference` and write a visual diff to `diff_out`.
    fn compare(
        &self,
        reference: &Path,
        candidate: &Path,
        diff_out: &Path,
    ) -> Result<DiffImage, CompareError>;
}

/// Comparator that forgives small spatial misalignment.
///
/// Each reference pixel is matched against the candidate pixels within
/// `radius` of the same position; the closest one (smallest summed channel
/// difference) supplies that pixel's difference. Antialiasing jitter of a
/// pixel or so therefore costs nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborhoodComparator {
    pub radius: u32,

    /// Multiplier applied to the written visualisation only.
    pub visual_gain: u8,
}

impl Default for NeighborhoodComparator {
    fn default() -> Self {
        Self {
            radius: 1,
            visual_gain: 4,
        }
    }
}

impl NeighborhoodComparator {
    pub fn with_radius(radius: u32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Compute the difference array for two decoded images of equal size.
    pub fn diff(&self, reference: &RgbImage, candidate: &RgbImage) -> DiffImage {
        let (width, height) = reference.dimensions();
        let r = i64::from(self.radius);
        let mut data = Vec::with_capacity(width as usize * height as usize * DIFF_CHANNELS);

        for y in 0..height {
            for x in 0..width {
                let a = reference.get_pixel(x, y);
                let mut best = [u8::MAX; DIFF_CHANNELS];
                let mut best_sum = u32::MAX;

                'search: for dy in -r..=r {
                    let ny = i64::from(y) + dy;
                    if ny < 0 || ny >= i64::from(height) {
                        continue;
                    }
                    for dx in -r..=r {
                        let nx = i64::from(x) + dx;
                        if nx < 0 || nx >= i64::from(width) {
                            continue;
                        }
                        let b = candidate.get_pixel(nx as u32, ny as u32);
                        let d = [
                            a[0].abs_diff(b[0]),
                            a[1].abs_diff(b[1]),
                            a[2].abs_diff(b[2]),
                        ];
                        let sum = d.iter().map(|&v| u32::from(v)).sum::<u32>();
                        if sum < best_sum {
                            best_sum = sum;
                            best = d;
                            if sum == 0 {
                                break 'search;
                            }
                        }
                    }
                }

                data.extend_from_slice(&best);
            }
        }

        DiffImage {
            width,
            height,
            data,
        }
    }

    fn visualise(&self, diff: &DiffImage) -> RgbImage {
        let gain = self.visual_gain.max(1);
        RgbImage::from_fn(diff.width, diff.height, |x, y| {
            let i = (y as usize * diff.width as usize + x as usize) * DIFF_CHANNELS;
            Rgb([
                diff.data[i].saturating_mul(gain),
                diff.data[i + 1].saturating_mul(gain),
                diff.data[i + 2].saturating_mul(gain),
            ])
        })
    }
}

impl ImageComparator for NeighborhoodComparator {
    fn compare(
        &self,
        reference: &Path,
        candidate: &Path,
        diff_out: &Path,
    ) -> Result<DiffImage, CompareError> {
        let reference_img = open_rgb(reference)?;
        let candidate_img = open_rgb(candidate)?;

        if reference_img.dimensions() != candidate_img.dimensions() {
            return Err(CompareError::DimensionMismatch {
                reference: reference_img.dimensions(),
                candidate: candidate_img.dimensions(),
            });
        }

        let diff = self.diff(&reference_img, &candidate_img);
        self.visualise(&diff)
            .save(diff_out)
            .map_err(|source| CompareError::Encode {
                path: diff_out.to_path_buf(),
                source,
            })?;

        debug!(
            reference = %reference.display(),
            candidate = %candidate.display(),
            mean_abs = diff.mean_abs(),
            "Compared images"
        );
        Ok(diff)
    }
}

fn open_rgb(path: &Path) -> Result<RgbImage, CompareError> {
    if !path.is_file() {
        return Err(CompareError::Missing {
            path: path.to_path_buf(),
        });
    }
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| CompareError::Decode {
            path: path.to_path_buf(),
            source,
        })
}
