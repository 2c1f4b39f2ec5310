//! Per-object metadata records

use crate::spatial::labels::{FovId, Label};
use std::collections::BTreeMap;

/// Discrete category assigned to an object by an external clustering step
pub type ClusterId = u32;

/// One row of object metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectRecord {
    /// FOV the object belongs to
    pub fov_id: FovId,
    /// Label matching the object's id in the label image
    pub label: Label,
    /// Centroid as (x, y) in image coordinate units
    pub centroid: (f64, f64),
    /// Cluster/phenotype assignment, if any
    pub cluster_id: Option<ClusterId>,
    /// Marker expression values keyed by marker name
    pub expression: BTreeMap<String, f64>,
    /// Categorical annotations such as lineage or cell type, keyed by column name
    pub annotations: BTreeMap<String, String>,
}

impl ObjectRecord {
    /// Create a record with no cluster, expression or annotations
    pub fn new(fov_id: impl Into<FovId>, label: Label, centroid: (f64, f64)) -> Self {
        Self {
            fov_id: fov_id.into(),
            label,
            centroid,
            ..Self::default()
        }
    }

    /// Set the cluster assignment
    #[must_use]
    pub fn with_cluster(mut self, cluster_id: ClusterId) -> Self {
        self.cluster_id = Some(cluster_id);
        self
    }

    /// Add a marker expression value
    #[must_use]
    pub fn with_expression(mut self, marker: impl Into<String>, value: f64) -> Self {
        self.expression.insert(marker.into(), value);
        self
    }

    /// Add a categorical annotation
    #[must_use]
    pub fn with_annotation(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(column.into(), value.into());
        self
    }
}

/// Group records by FOV, preserving the input order inside each FOV
pub fn group_by_fov(records: Vec<ObjectRecord>) -> BTreeMap<FovId, Vec<ObjectRecord>> {
    let mut grouped: BTreeMap<FovId, Vec<ObjectRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.fov_id.clone()).or_default().push(record);
    }
    grouped
}
