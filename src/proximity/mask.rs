//! Bit-packed binarization of distance matrices under a distance limit

use crate::io::error::{Result, invalid_arguments, invalid_input};
use crate::spatial::distance::DistanceMatrix;
use bitvec::prelude::*;

/// Bit-packed binarization of a distance matrix under a distance limit
///
/// Bit (a, b) is set when `D[a, b] < dist_lim`. Because the diagonal of a
/// distance matrix is zero, every object is close to itself.
#[derive(Clone, Debug)]
pub struct ProximityMask {
    rows: Vec<BitVec>,
    dist_lim: f64,
}

impl ProximityMask {
    /// Binarize a distance matrix
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if `dist_lim` is not finite and positive
    pub fn new(distances: &DistanceMatrix, dist_lim: f64) -> Result<Self> {
        validate_dist_lim(dist_lim)?;
        let rows = distances
            .values()
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|&d| d < dist_lim).collect::<BitVec>())
            .collect();
        Ok(Self { rows, dist_lim })
    }

    /// Distance limit used for binarization
    pub const fn dist_lim(&self) -> f64 {
        self.dist_lim
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Test if the mask covers no objects
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Test whether objects at positions `a` and `b` are close
    pub fn is_close(&self, a: usize, b: usize) -> bool {
        self.rows
            .get(a)
            .and_then(|row| row.get(b).as_deref().copied())
            .unwrap_or(false)
    }

    /// Total number of close ordered pairs, self-pairs included
    pub fn count_ones(&self) -> u64 {
        self.rows.iter().map(|row| row.count_ones() as u64).sum()
    }

    /// Column mask selecting the given positions
    pub fn column_mask(&self, positions: &[usize]) -> BitVec {
        let mut mask = BitVec::repeat(false, self.len());
        for &position in positions {
            if position < mask.len() {
                mask.set(position, true);
            }
        }
        mask
    }

    /// Number of close pairs between distinct row positions and a column mask
    ///
    /// Each row is reduced against the mask word by word, so the cost is
    /// proportional to `rows.len() * len / word size`.
    pub fn count_block(&self, rows: &[usize], column_mask: &BitVec) -> u64 {
        rows.iter()
            .filter_map(|&r| self.rows.get(r))
            .map(|row| and_count(row, column_mask))
            .sum()
    }

    /// Number of close pairs among sampled rows and columns, counting repeats
    pub fn count_sampled(&self, rows: &[usize], cols: &[usize]) -> u64 {
        rows.iter()
            .filter_map(|&r| self.rows.get(r))
            .map(|row| {
                cols.iter()
                    .filter(|&&c| row.get(c).as_deref().copied().unwrap_or(false))
                    .count() as u64
            })
            .sum()
    }
}

// Popcount of the intersection of two bit vectors over their common length
fn and_count(row: &BitVec, mask: &BitVec) -> u64 {
    let word_bits = usize::BITS as usize;
    let len = row.len().min(mask.len());
    let (full, tail) = (len / word_bits, len % word_bits);
    let (a, b) = (row.as_raw_slice(), mask.as_raw_slice());

    let mut total: u64 = a
        .iter()
        .zip(b)
        .take(full)
        .map(|(x, y)| u64::from((x & y).count_ones()))
        .sum();
    if tail > 0 {
        if let (Some(x), Some(y)) = (a.get(full), b.get(full)) {
            // Lsb0 ordering keeps the live bits in the low end of the last word
            let live = (1usize << tail) - 1;
            total += u64::from((x & y & live).count_ones());
        }
    }
    total
}

/// Reject distance limits that cannot binarize a matrix
///
/// # Errors
///
/// Returns `InvalidArguments` if `dist_lim` is not finite and positive
pub fn validate_dist_lim(dist_lim: f64) -> Result<()> {
    if dist_lim.is_finite() && dist_lim > 0.0 {
        Ok(())
    } else {
        Err(invalid_arguments(
            "dist_lim",
            &format!("distance limit must be finite and positive, got {dist_lim}"),
        ))
    }
}

/// Reject empty distance matrices before resampling from them
///
/// # Errors
///
/// Returns `InvalidInput` if the mask covers no objects
pub fn ensure_non_empty(mask: &ProximityMask) -> Result<()> {
    if mask.is_empty() {
        Err(invalid_input(&"distance matrix contains no objects"))
    } else {
        Ok(())
    }
}
