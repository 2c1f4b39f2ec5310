//! Per-object neighbor counts broken down by cluster

use crate::io::error::Result;
use crate::proximity::mask::ProximityMask;
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::labels::Label;
use crate::spatial::objects::{ClusterId, ObjectRecord};
use ndarray::Array2;

/// Neighbor counts and frequencies per object and cluster
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborCounts {
    /// Object labels in row order
    pub labels: Vec<Label>,
    /// Cluster ids in column order (ascending)
    pub clusters: Vec<ClusterId>,
    /// Number of close objects of each cluster, objects x clusters
    pub counts: Array2<u64>,
    /// Counts divided by the object's total neighbor count; NaN without neighbors
    pub freqs: Array2<f64>,
}

impl NeighborCounts {
    /// Count for an object label and cluster
    pub fn count(&self, label: Label, cluster: ClusterId) -> Option<u64> {
        let (row, col) = self.index(label, cluster)?;
        self.counts.get([row, col]).copied()
    }

    /// Frequency for an object label and cluster
    pub fn freq(&self, label: Label, cluster: ClusterId) -> Option<f64> {
        let (row, col) = self.index(label, cluster)?;
        self.freqs.get([row, col]).copied()
    }

    fn index(&self, label: Label, cluster: ClusterId) -> Option<(usize, usize)> {
        let row = self.labels.iter().position(|&l| l == label)?;
        let col = self.clusters.binary_search(&cluster).ok()?;
        Some((row, col))
    }
}

/// Count, for every object, how many close objects belong to each cluster
///
/// With `self_neighbor` an object is its own neighbor (its zero self-distance
/// is below any positive limit). Objects without a cluster id still count
/// toward the neighbor total but have no column of their own.
///
/// # Errors
///
/// Returns:
/// - `InvalidArguments` if `dist_lim` is not finite and positive
/// - `InvalidInput` if an object's label is absent from the distance matrix
pub fn compute_neighbor_counts(
    objects: &[ObjectRecord],
    distances: &DistanceMatrix,
    dist_lim: f64,
    self_neighbor: bool,
) -> Result<NeighborCounts> {
    let mask = ProximityMask::new(distances, dist_lim)?;
    let labels: Vec<Label> = objects.iter().map(|o| o.label).collect();
    let positions = distances.positions_of(&labels)?;

    let mut clusters: Vec<ClusterId> = objects.iter().filter_map(|o| o.cluster_id).collect();
    clusters.sort_unstable();
    clusters.dedup();
    let columns: Vec<Option<usize>> = objects
        .iter()
        .map(|o| o.cluster_id.and_then(|c| clusters.binary_search(&c).ok()))
        .collect();

    let n = objects.len();
    let mut counts = Array2::<u64>::zeros((n, clusters.len()));
    let mut freqs = Array2::<f64>::zeros((n, clusters.len()));

    for (row, &a) in positions.iter().enumerate() {
        let mut total = 0u64;
        for (other, (&b, column)) in positions.iter().zip(&columns).enumerate() {
            if (!self_neighbor && other == row) || !mask.is_close(a, b) {
                continue;
            }
            total += 1;
            if let Some(cell) = column.and_then(|c| counts.get_mut([row, c])) {
                *cell += 1;
            }
        }

        for col in 0..clusters.len() {
            let count = counts.get([row, col]).copied().unwrap_or(0);
            if let Some(cell) = freqs.get_mut([row, col]) {
                *cell = if total == 0 {
                    f64::NAN
                } else {
                    count as f64 / total as f64
                };
            }
        }
    }

    Ok(NeighborCounts {
        labels,
        clusters,
        counts,
        freqs,
    })
}
