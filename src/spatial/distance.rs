//! Label-indexed pairwise centroid distance matrices

use crate::io::error::{EnrichmentError, Result, invalid_input};
use crate::spatial::labels::{Centroid, FovId, Label, LabeledImage};
use crate::spatial::objects::ObjectRecord;
use ndarray::Array2;
use std::collections::{BTreeMap, HashMap};

// Relative tolerance used when validating externally supplied matrices
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric, zero-diagonal matrix of Euclidean distances addressed by label
///
/// Rows and columns follow the ascending label order. Labels need not be
/// contiguous, so every lookup goes through the label-to-position map rather
/// than assuming `position == label - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<Label>,
    positions: HashMap<Label, usize>,
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Compute pairwise Euclidean distances between centroids
    ///
    /// Centroids are reordered by ascending label.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if two centroids share a label
    pub fn from_centroids(centroids: &[Centroid]) -> Result<Self> {
        let mut sorted = centroids.to_vec();
        sorted.sort_by_key(|c| c.label);

        let n = sorted.len();
        let mut values = Array2::zeros((n, n));
        for (i, a) in sorted.iter().enumerate() {
            for (j, b) in sorted.iter().enumerate().skip(i + 1) {
                let d = a.distance_to(b);
                if let Some(cell) = values.get_mut([i, j]) {
                    *cell = d;
                }
                if let Some(cell) = values.get_mut([j, i]) {
                    *cell = d;
                }
            }
        }

        let labels = sorted.iter().map(|c| c.label).collect();
        Self::from_parts(labels, values)
    }

    /// Compute distances from the centroids carried by metadata records
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if two records share a label
    pub fn from_records(records: &[ObjectRecord]) -> Result<Self> {
        let centroids: Vec<Centroid> = records
            .iter()
            .map(|r| Centroid {
                label: r.label,
                // Records carry (x, y); x runs along columns
                row: r.centroid.1,
                col: r.centroid.0,
                area: 1,
            })
            .collect();
        Self::from_centroids(&centroids)
    }

    /// Assemble a matrix from labels and raw values, validating every invariant
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if:
    /// - The value matrix is not square or does not match the label count
    /// - Labels are duplicated or zero
    /// - Any entry is negative or not finite
    /// - The matrix is not symmetric or has a non-zero diagonal
    pub fn from_parts(labels: Vec<Label>, values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols || rows != labels.len() {
            return Err(invalid_input(&format!(
                "distance matrix of shape {rows}x{cols} does not match {} labels",
                labels.len()
            )));
        }

        let mut positions = HashMap::with_capacity(labels.len());
        for (position, &label) in labels.iter().enumerate() {
            if label == 0 {
                return Err(invalid_input(&"label 0 is reserved for background"));
            }
            if positions.insert(label, position).is_some() {
                return Err(invalid_input(&format!("duplicate label {label}")));
            }
        }

        for ((i, j), &d) in values.indexed_iter() {
            if !d.is_finite() || d < 0.0 {
                return Err(invalid_input(&format!(
                    "distance at ({i}, {j}) must be finite and non-negative, got {d}"
                )));
            }
            if i == j && d != 0.0 {
                return Err(invalid_input(&format!(
                    "diagonal distance at position {i} must be zero, got {d}"
                )));
            }
            if j > i {
                let mirrored = values.get([j, i]).copied().unwrap_or(f64::NAN);
                if (d - mirrored).abs() > SYMMETRY_TOLERANCE * d.max(1.0) {
                    return Err(invalid_input(&format!(
                        "distance matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        Ok(Self {
            labels,
            positions,
            values,
        })
    }

    /// Labels in row/column order
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Raw distance values in label order
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Test if the matrix covers no objects
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row/column position of a label
    pub fn position(&self, label: Label) -> Option<usize> {
        self.positions.get(&label).copied()
    }

    /// Distance between two objects addressed by label
    pub fn get(&self, a: Label, b: Label) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        self.values.get([i, j]).copied()
    }

    /// Translate labels into row/column positions
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the first label absent from the matrix
    pub fn positions_of(&self, labels: &[Label]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|&label| {
                self.position(label).ok_or_else(|| {
                    invalid_input(&format!("label {label} is not present in the distance matrix"))
                })
            })
            .collect()
    }

    /// Restrict the matrix to a subset of labels, keeping ascending order
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a label is absent from the matrix
    pub fn subset(&self, labels: &[Label]) -> Result<Self> {
        let mut kept = labels.to_vec();
        kept.sort_unstable();
        kept.dedup();
        let positions = self.positions_of(&kept)?;

        let n = kept.len();
        let mut values = Array2::zeros((n, n));
        for (i, &pi) in positions.iter().enumerate() {
            for (j, &pj) in positions.iter().enumerate() {
                if let (Some(cell), Some(&d)) = (values.get_mut([i, j]), self.values.get([pi, pj]))
                {
                    *cell = d;
                }
            }
        }
        Self::from_parts(kept, values)
    }
}

/// Builds distance matrices from labeled images
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMatrixBuilder;

impl DistanceMatrixBuilder {
    /// Build the distance matrix of one labeled image
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the image contains no labeled objects
    pub fn build(image: &LabeledImage) -> Result<DistanceMatrix> {
        let centroids = image.centroids();
        if centroids.is_empty() {
            return Err(invalid_input(&"label image contains no objects"));
        }
        DistanceMatrix::from_centroids(&centroids)
    }

    /// Build one distance matrix per FOV
    ///
    /// FOVs are independent; the first failure is returned tagged with its FOV id.
    ///
    /// # Errors
    ///
    /// Returns `FovFailed` wrapping the cause if any FOV cannot be processed
    pub fn build_all(
        images: &BTreeMap<FovId, LabeledImage>,
    ) -> Result<BTreeMap<FovId, DistanceMatrix>> {
        images
            .iter()
            .map(|(fov_id, image)| {
                Self::build(image)
                    .map(|matrix| (fov_id.clone(), matrix))
                    .map_err(|e| EnrichmentError::FovFailed {
                        fov_id: fov_id.clone(),
                        source: Box::new(e),
                    })
            })
            .collect()
    }
}
