//! Classification of objects into ordered positive-label sets

use crate::io::error::{EnrichmentError, Result, invalid_arguments, invalid_input};
use crate::spatial::labels::Label;
use crate::spatial::objects::{ClusterId, ObjectRecord};
use std::fmt;
use std::str::FromStr;

/// Labels positive for one marker or cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositiveSet {
    name: String,
    labels: Vec<Label>,
}

impl PositiveSet {
    /// Create a set, sorting and deduplicating the labels
    pub fn new(name: impl Into<String>, mut labels: Vec<Label>) -> Self {
        labels.sort_unstable();
        labels.dedup();
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Marker or cluster name, used to address result matrices
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct labels in ascending order
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of positive objects
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Test if no object is positive
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Ordered positive sets; the order defines row/column indices downstream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositiveSets {
    sets: Vec<PositiveSet>,
}

impl PositiveSets {
    /// Wrap sets in caller order
    pub const fn new(sets: Vec<PositiveSet>) -> Self {
        Self { sets }
    }

    /// Number of markers/clusters
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Test if there are no sets
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set at index `j`
    pub fn get(&self, j: usize) -> Option<&PositiveSet> {
        self.sets.get(j)
    }

    /// All sets in order
    pub fn as_slice(&self) -> &[PositiveSet] {
        &self.sets
    }

    /// Marker/cluster names in order
    pub fn names(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.name.clone()).collect()
    }

    /// Size of every set in order
    pub fn sizes(&self) -> Vec<usize> {
        self.sets.iter().map(PositiveSet::len).collect()
    }
}

/// Produces the ordered positive-label sets of one FOV
pub trait PositivitySelector: Send + Sync {
    /// Classify the FOV's objects
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the objects lack data the selector needs
    fn select(&self, objects: &[ObjectRecord]) -> Result<PositiveSets>;

    /// Names of the sets this selector produces, in order
    fn names(&self) -> Vec<String>;
}

/// Positive set = objects assigned to a given cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSelector {
    cluster_ids: Vec<ClusterId>,
}

impl ClusterSelector {
    /// Create a selector over an ordered cluster list
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if the cluster list is empty
    pub fn new(cluster_ids: Vec<ClusterId>) -> Result<Self> {
        if cluster_ids.is_empty() {
            return Err(invalid_arguments(
                "cluster_ids",
                &"cluster analysis requires at least one cluster id",
            ));
        }
        Ok(Self { cluster_ids })
    }

    /// Cluster ids in order
    pub fn cluster_ids(&self) -> &[ClusterId] {
        &self.cluster_ids
    }
}

impl PositivitySelector for ClusterSelector {
    fn select(&self, objects: &[ObjectRecord]) -> Result<PositiveSets> {
        Ok(PositiveSets::new(
            self.cluster_ids
                .iter()
                .map(|&cluster| {
                    let labels = objects
                        .iter()
                        .filter(|o| o.cluster_id == Some(cluster))
                        .map(|o| o.label)
                        .collect();
                    PositiveSet::new(cluster.to_string(), labels)
                })
                .collect(),
        ))
    }

    fn names(&self) -> Vec<String> {
        self.cluster_ids.iter().map(ToString::to_string).collect()
    }
}

/// Positive set = objects whose marker expression strictly exceeds a threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSelector {
    markers: Vec<String>,
    thresholds: Vec<f64>,
}

impl ThresholdSelector {
    /// Create a selector over an ordered marker list and aligned thresholds
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if:
    /// - The marker list is empty
    /// - The threshold vector length differs from the marker count
    /// - A threshold is NaN
    pub fn new(markers: Vec<String>, thresholds: Vec<f64>) -> Result<Self> {
        if markers.is_empty() {
            return Err(invalid_arguments(
                "markers",
                &"channel analysis requires at least one marker",
            ));
        }
        if thresholds.len() != markers.len() {
            return Err(invalid_arguments(
                "thresholds",
                &format!(
                    "{} thresholds supplied for {} markers",
                    thresholds.len(),
                    markers.len()
                ),
            ));
        }
        if let Some(position) = thresholds.iter().position(|t| t.is_nan()) {
            return Err(invalid_arguments(
                "thresholds",
                &format!("threshold for marker {position} is NaN"),
            ));
        }
        Ok(Self {
            markers,
            thresholds,
        })
    }

    /// Markers in order
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Thresholds aligned with the markers
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl PositivitySelector for ThresholdSelector {
    fn select(&self, objects: &[ObjectRecord]) -> Result<PositiveSets> {
        let mut sets = Vec::with_capacity(self.markers.len());
        for (marker, &threshold) in self.markers.iter().zip(&self.thresholds) {
            let mut labels = Vec::new();
            for object in objects {
                let value = object.expression.get(marker).copied().ok_or_else(|| {
                    invalid_input(&format!(
                        "object {} has no expression value for marker '{marker}'",
                        object.label
                    ))
                })?;
                if value > threshold {
                    labels.push(object.label);
                }
            }
            sets.push(PositiveSet::new(marker.clone(), labels));
        }
        Ok(PositiveSets::new(sets))
    }

    fn names(&self) -> Vec<String> {
        self.markers.clone()
    }
}

/// Analysis mode tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisType {
    /// Positivity from cluster/phenotype assignment
    Cluster,
    /// Positivity from thresholded marker expression
    Channel,
}

impl AnalysisType {
    /// Canonical tag
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = EnrichmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cluster" => Ok(Self::Cluster),
            "channel" => Ok(Self::Channel),
            other => Err(EnrichmentError::InvalidAnalysisType {
                value: other.to_string(),
            }),
        }
    }
}

/// Either positivity variant behind one value
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Cluster membership
    Cluster(ClusterSelector),
    /// Marker thresholding
    Threshold(ThresholdSelector),
}

impl Selector {
    /// Build the selector for a mode tag from optional mode-specific inputs
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidAnalysisType` if `mode` is neither `cluster` nor `channel`
    /// - `InvalidArguments` if the inputs required by the mode are absent or mismatched
    pub fn from_parts(
        mode: &str,
        cluster_ids: Option<Vec<ClusterId>>,
        markers: Option<Vec<String>>,
        thresholds: Option<Vec<f64>>,
    ) -> Result<Self> {
        match mode.parse::<AnalysisType>()? {
            AnalysisType::Cluster => {
                let ids = cluster_ids.ok_or_else(|| {
                    invalid_arguments("cluster_ids", &"cluster analysis requires cluster ids")
                })?;
                Ok(Self::Cluster(ClusterSelector::new(ids)?))
            }
            AnalysisType::Channel => {
                let markers = markers.ok_or_else(|| {
                    invalid_arguments("markers", &"channel analysis requires a marker list")
                })?;
                let thresholds = thresholds.ok_or_else(|| {
                    invalid_arguments("thresholds", &"channel analysis requires thresholds")
                })?;
                Ok(Self::Threshold(ThresholdSelector::new(markers, thresholds)?))
            }
        }
    }

    /// Mode of this selector
    pub const fn analysis_type(&self) -> AnalysisType {
        match self {
            Self::Cluster(_) => AnalysisType::Cluster,
            Self::Threshold(_) => AnalysisType::Channel,
        }
    }
}

impl PositivitySelector for Selector {
    fn select(&self, objects: &[ObjectRecord]) -> Result<PositiveSets> {
        match self {
            Self::Cluster(selector) => selector.select(objects),
            Self::Threshold(selector) => selector.select(objects),
        }
    }

    fn names(&self) -> Vec<String> {
        match self {
            Self::Cluster(selector) => selector.names(),
            Self::Threshold(selector) => selector.names(),
        }
    }
}
