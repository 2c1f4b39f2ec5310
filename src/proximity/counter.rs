//! Observed close-pair counts between positive sets

use crate::io::error::{Result, invalid_arguments};
use crate::proximity::mask::{ProximityMask, validate_dist_lim};
use crate::proximity::positivity::{PositiveSets, PositivitySelector, Selector};
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::objects::{ClusterId, ObjectRecord};
use bitvec::vec::BitVec;
use ndarray::Array2;
use rayon::prelude::*;

/// Symmetric `M x M` matrix of close-pair counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityCountMatrix {
    names: Vec<String>,
    set_sizes: Vec<usize>,
    counts: Array2<u64>,
}

impl ProximityCountMatrix {
    /// Assemble a count matrix from already computed parts
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if names, sizes and the matrix disagree in size
    /// or the matrix is not square
    pub fn from_parts(
        names: Vec<String>,
        set_sizes: Vec<usize>,
        counts: Array2<u64>,
    ) -> Result<Self> {
        let (rows, cols) = counts.dim();
        if rows != cols || rows != names.len() || rows != set_sizes.len() {
            return Err(invalid_arguments(
                "counts",
                &format!(
                    "count matrix of shape {rows}x{cols} does not match {} names and {} set sizes",
                    names.len(),
                    set_sizes.len()
                ),
            ));
        }
        Ok(Self {
            names,
            set_sizes,
            counts,
        })
    }

    /// Marker/cluster names in row/column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of positive objects per marker/cluster
    pub fn set_sizes(&self) -> &[usize] {
        &self.set_sizes
    }

    /// Raw count matrix
    pub const fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    /// Number of markers/clusters
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Test if the matrix has no markers
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Count at index (j, k)
    pub fn get(&self, j: usize, k: usize) -> Option<u64> {
        self.counts.get([j, k]).copied()
    }

    /// Count addressed by marker/cluster names
    pub fn get_named(&self, marker_j: &str, marker_k: &str) -> Option<u64> {
        let j = self.names.iter().position(|n| n == marker_j)?;
        let k = self.names.iter().position(|n| n == marker_k)?;
        self.get(j, k)
    }
}

/// Unordered index pairs (j, k) with j <= k
pub fn upper_triangle_pairs(m: usize) -> Vec<(usize, usize)> {
    (0..m).flat_map(|j| (j..m).map(move |k| (j, k))).collect()
}

/// Count close pairs between every pair of positive sets
///
/// `close[j, k]` is the number of (a, b) with a in set j, b in set k and
/// `D[a, b] < dist_lim`. Self-pairs are included, so an object in both sets
/// contributes to the diagonal.
///
/// # Errors
///
/// Returns:
/// - `InvalidArguments` if `dist_lim` is not finite and positive
/// - `InvalidInput` if a positive label is absent from the distance matrix
pub fn compute_close_counts(
    distances: &DistanceMatrix,
    dist_lim: f64,
    sets: &PositiveSets,
) -> Result<ProximityCountMatrix> {
    let mask = ProximityMask::new(distances, dist_lim)?;
    count_with_mask(distances, &mask, sets)
}

/// Count close pairs with a precomputed mask
///
/// # Errors
///
/// Returns `InvalidInput` if a positive label is absent from the distance matrix
pub fn count_with_mask(
    distances: &DistanceMatrix,
    mask: &ProximityMask,
    sets: &PositiveSets,
) -> Result<ProximityCountMatrix> {
    let positions: Vec<Vec<usize>> = sets
        .as_slice()
        .iter()
        .map(|set| distances.positions_of(set.labels()))
        .collect::<Result<_>>()?;
    let column_masks: Vec<BitVec> = positions.iter().map(|p| mask.column_mask(p)).collect();

    let m = sets.len();
    let pair_counts: Vec<((usize, usize), u64)> = upper_triangle_pairs(m)
        .into_par_iter()
        .map(|(j, k)| {
            let count = match (positions.get(j), column_masks.get(k)) {
                (Some(rows), Some(cols)) => mask.count_block(rows, cols),
                _ => 0,
            };
            ((j, k), count)
        })
        .collect();

    let mut counts = Array2::zeros((m, m));
    for ((j, k), count) in pair_counts {
        if let Some(cell) = counts.get_mut([j, k]) {
            *cell = count;
        }
        if let Some(cell) = counts.get_mut([k, j]) {
            *cell = count;
        }
    }

    tracing::debug!(markers = m, dist_lim = mask.dist_lim(), "computed close counts");
    ProximityCountMatrix::from_parts(sets.names(), sets.sizes(), counts)
}

/// Select positive sets and count close pairs for a mode-tagged request
///
/// # Errors
///
/// Returns:
/// - `InvalidAnalysisType` if `mode` is neither `cluster` nor `channel`
/// - `InvalidArguments` if the mode-specific inputs are absent or mismatched
/// - `InvalidInput` if objects lack expression values or labels are unknown
pub fn compute_close_cell_num(
    distances: &DistanceMatrix,
    dist_lim: f64,
    objects: &[ObjectRecord],
    mode: &str,
    cluster_ids: Option<Vec<ClusterId>>,
    markers: Option<Vec<String>>,
    thresholds: Option<Vec<f64>>,
) -> Result<(ProximityCountMatrix, PositiveSets)> {
    let selector = Selector::from_parts(mode, cluster_ids, markers, thresholds)?;
    validate_dist_lim(dist_lim)?;
    let sets = selector.select(objects)?;
    let counts = compute_close_counts(distances, dist_lim, &sets)?;
    Ok((counts, sets))
}
