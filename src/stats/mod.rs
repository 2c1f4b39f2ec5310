//! Enrichment statistics and multiple-testing correction

/// Z-scores and empirical p-values per marker pair
pub mod enrichment;
/// P-value correction procedures
pub mod multitest;

pub use enrichment::{
    EnrichmentResult, NumericDegeneracy, Statistic, calculate_enrichment_stats,
};
pub use multitest::{CorrectionMethod, MultipleTesting};
