//! Null distribution sampling and random stream management

/// Context-aware restriction of the resampling pool
pub mod context;
/// Null tensor generation by value or label resampling
pub mod null;
/// Per-FOV and per-pair random streams
pub mod streams;

pub use context::{ContextFilter, SamplingPool};
pub use null::{NullSampler, NullTensor, ResamplingStrategy, compute_close_cell_num_random};
