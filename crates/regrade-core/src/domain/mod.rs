//! Domain models for regrade.
//!
//! - `SceneEntry`: a catalog scene and its tags
//! - `SelectedTest`: a scene chosen for the current run
//! - `ExecutionResult`: what the renderer left behind for a test
//! - `ScoreRecord`: the scored comparison against the reference

pub mod error;
pub mod record;
pub mod scene;

pub use error::{RegradeError, Result};
pub use record::{ExecutionResult, ReferenceConvention, RenderStatus, ScoreRecord};
pub use scene::{category_of, SceneEntry, SelectedTest, Tag, CATEGORY_SEPARATOR};
