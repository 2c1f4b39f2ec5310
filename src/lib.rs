//! Spatial proximity enrichment of labeled objects across fields of view
//!
//! Distances between object centroids are binarized under a distance limit,
//! close pairs between marker-positive (or cluster) sets are counted, and the
//! counts are compared against a resampled null distribution to produce
//! z-scores, empirical p-values and multiple-testing corrected significance.

#![forbid(unsafe_code)]

/// Per-FOV pipeline and parallel batch runner
pub mod analysis;
/// Input/output, command-line plumbing and error handling
pub mod io;
/// Positive-set selection, close-pair counting and neighbor counts
pub mod proximity;
/// Null distribution sampling and random streams
pub mod sampling;
/// Label images, centroids, distance matrices and synthetic data
pub mod spatial;
/// Enrichment statistics and multiple-testing correction
pub mod stats;

pub use io::error::{EnrichmentError, Result};
