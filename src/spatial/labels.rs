//! Labeled object maps and centroid extraction

use crate::io::error::{Result, invalid_input};
use ndarray::Array2;
use num_traits::{PrimInt, Unsigned};
use std::collections::BTreeMap;

/// Positive integer identifying one segmented object within a FOV
pub type Label = u32;

/// Identifier of a field of view
pub type FovId = String;

/// Geometric center of one labeled object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    /// Object label
    pub label: Label,
    /// Mean row coordinate of the object's pixels
    pub row: f64,
    /// Mean column coordinate of the object's pixels
    pub col: f64,
    /// Number of pixels carrying the label
    pub area: usize,
}

impl Centroid {
    /// Euclidean distance to another centroid
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.row - other.row).hypot(self.col - other.col)
    }
}

/// 2-D grid of object ids, 0 being background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pixels: Array2<Label>,
}

impl LabeledImage {
    /// Wrap an already-typed label grid
    pub const fn new(pixels: Array2<Label>) -> Self {
        Self { pixels }
    }

    /// Convert a grid of any unsigned integer type into a label image
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a pixel value does not fit into a [`Label`]
    pub fn from_raw<T>(raw: &Array2<T>) -> Result<Self>
    where
        T: PrimInt + Unsigned,
    {
        let mut pixels = Array2::zeros(raw.dim());
        for ((position, value), target) in raw.indexed_iter().zip(pixels.iter_mut()) {
            *target = value.to_u32().ok_or_else(|| {
                invalid_input(&format!(
                    "label value at {position:?} exceeds the supported label range"
                ))
            })?;
        }
        Ok(Self { pixels })
    }

    /// Underlying label grid
    pub const fn pixels(&self) -> &Array2<Label> {
        &self.pixels
    }

    /// Grid dimensions as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Distinct positive labels in ascending order
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self.pixels.iter().copied().filter(|&l| l > 0).collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Centroid of every object, ascending by label
    ///
    /// The centroid is the arithmetic mean of the (row, col) coordinates of all
    /// pixels carrying the label.
    pub fn centroids(&self) -> Vec<Centroid> {
        // (row sum, col sum, pixel count)
        let mut accumulators: BTreeMap<Label, (f64, f64, usize)> = BTreeMap::new();
        for ((row, col), &label) in self.pixels.indexed_iter() {
            if label == 0 {
                continue;
            }
            let entry = accumulators.entry(label).or_insert((0.0, 0.0, 0));
            entry.0 += row as f64;
            entry.1 += col as f64;
            entry.2 += 1;
        }

        accumulators
            .into_iter()
            .map(|(label, (row_sum, col_sum, area))| Centroid {
                label,
                row: row_sum / area as f64,
                col: col_sum / area as f64,
                area,
            })
            .collect()
    }
}
