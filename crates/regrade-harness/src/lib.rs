//! Regrade harness
//!
//! Drives the renderer under test and sequences a run:
//! - `renderer`: the `Renderer` seam and the external process driver
//! - `pool`: bounded worker pool
//! - `runner`: per-scene execution with failure isolation
//! - `pipeline`: the run orchestrator

pub mod pipeline;
pub mod pool;
pub mod renderer;
pub mod runner;

// Re-export key types
pub use pipeline::{RunOutcome, RunPipeline};
pub use pool::WorkerPool;
pub use renderer::{ExternalRenderer, Renderer};
pub use runner::{run_batch, run_scene};
