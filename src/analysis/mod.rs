//! Per-FOV analysis pipeline and batch execution

/// Parallel best-effort batch runner
pub mod batch;
/// Selection, counting, sampling and statistics for one FOV
pub mod pipeline;

pub use batch::{BatchReport, CancellationToken, FovOutcome, run_batch, run_batch_with};
pub use pipeline::{AnalysisConfig, FovAnalysis, FovInput, analyze_fov};
