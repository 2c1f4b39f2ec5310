//! Positivity selection and close-pair counting

/// Observed close-pair counts between positive sets
pub mod counter;
/// Bit-packed distance binarization
pub mod mask;
/// Per-object neighbor counts
pub mod neighbors;
/// Positive-set selection by cluster or marker threshold
pub mod positivity;

pub use counter::{ProximityCountMatrix, compute_close_cell_num, compute_close_counts};
pub use mask::ProximityMask;
pub use positivity::{
    AnalysisType, ClusterSelector, PositiveSet, PositiveSets, PositivitySelector, Selector,
    ThresholdSelector,
};
