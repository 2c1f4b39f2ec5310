//! Restriction of the resampling pool to selected cell types

use crate::io::error::{Result, invalid_arguments};
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::objects::ObjectRecord;

/// Objects eligible to be drawn when building the null distribution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SamplingPool {
    /// Every object in the distance matrix
    #[default]
    All,
    /// Only the listed distance-matrix positions (distinct, ascending)
    Restricted(Vec<usize>),
}

impl SamplingPool {
    /// Number of eligible objects given the matrix size
    pub fn size(&self, total: usize) -> usize {
        match self {
            Self::All => total,
            Self::Restricted(positions) => positions.len(),
        }
    }

    /// Position of the `index`-th eligible object
    pub fn position(&self, index: usize) -> Option<usize> {
        match self {
            Self::All => Some(index),
            Self::Restricted(positions) => positions.get(index).copied(),
        }
    }
}

/// Restricts resampling to objects annotated with one of the given cell types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFilter {
    /// Annotation column holding the cell type
    pub column: String,
    /// Cell types eligible for resampling
    pub cell_types: Vec<String>,
}

impl ContextFilter {
    /// Create a filter over an annotation column
    pub fn new(column: impl Into<String>, cell_types: Vec<String>) -> Self {
        Self {
            column: column.into(),
            cell_types,
        }
    }

    /// Resolve the eligible distance-matrix positions for one FOV
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidArguments` if no cell types are given, the column is absent from
    ///   every record, or no object of an eligible type remains
    /// - `InvalidInput` if an eligible object's label is absent from the matrix
    pub fn pool(&self, objects: &[ObjectRecord], distances: &DistanceMatrix) -> Result<SamplingPool> {
        if self.cell_types.is_empty() {
            return Err(invalid_arguments(
                "cell_types",
                &"context-aware sampling needs at least one cell type",
            ));
        }
        if !objects
            .iter()
            .any(|o| o.annotations.contains_key(&self.column))
        {
            return Err(invalid_arguments(
                "context_column",
                &format!("column '{}' does not exist in the object metadata", self.column),
            ));
        }

        let labels: Vec<_> = objects
            .iter()
            .filter(|o| {
                o.annotations
                    .get(&self.column)
                    .is_some_and(|value| self.cell_types.contains(value))
            })
            .map(|o| o.label)
            .collect();
        if labels.is_empty() {
            return Err(invalid_arguments(
                "cell_types",
                &format!(
                    "none of the cell types {:?} occur in column '{}'",
                    self.cell_types, self.column
                ),
            ));
        }

        let mut positions = distances.positions_of(&labels)?;
        positions.sort_unstable();
        positions.dedup();
        Ok(SamplingPool::Restricted(positions))
    }
}
