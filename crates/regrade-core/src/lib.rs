//! Regrade Core Library
//!
//! Building blocks of a visual-regression run:
//! - `catalog` / `selector`: which scenes run, in catalog order
//! - `config`: the per-run configuration and output allocation
//! - `compare` / `scorer`: tolerant image difference reduced to `0..=100`
//! - `report`: category-grouped document, HTML and JSON output

pub mod catalog;
pub mod compare;
pub mod config;
pub mod domain;
pub mod report;
pub mod scorer;
pub mod selector;
pub mod telemetry;

pub use catalog::Catalog;
pub use compare::{CompareError, DiffImage, ImageComparator, NeighborhoodComparator};
pub use config::{RunConfig, Viewport};
pub use domain::{
    category_of, ExecutionResult, ReferenceConvention, RegradeError, RenderStatus, Result,
    SceneEntry, ScoreRecord, SelectedTest, Tag,
};
pub use report::{build_report, render_html, ReportDocument, RunSummary};
pub use scorer::{resolve_reference, score_from_mean_abs_diff, ResolvedReference, Scorer};
pub use selector::{select, Inclusion, Selection};
pub use telemetry::init_tracing;
