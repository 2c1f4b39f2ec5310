//! Spatial data structures: label images, object records and distance matrices
//!
//! This module contains the leaf of the pipeline:
//! - Label maps and centroid extraction
//! - Label-indexed distance matrices
//! - Object metadata records
//! - Synthetic spatial data for controls and tests

/// Label-indexed distance matrices and their builder
pub mod distance;
/// Label images and centroids
pub mod labels;
/// Per-object metadata
pub mod objects;
/// Seedable synthetic spatial data
pub mod synthetic;

pub use distance::{DistanceMatrix, DistanceMatrixBuilder};
pub use labels::{Centroid, FovId, Label, LabeledImage};
pub use objects::{ClusterId, ObjectRecord};
