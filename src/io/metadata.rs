//! Object metadata tables (one row per segmented object)

use crate::io::configuration::{
    DEFAULT_FOV_COLUMN, DEFAULT_LABEL_COLUMN, DEFAULT_X_COLUMN, DEFAULT_Y_COLUMN,
};
use crate::io::error::{EnrichmentError, Result, invalid_arguments};
use crate::spatial::labels::Label;
use crate::spatial::objects::{ClusterId, ObjectRecord};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

/// Column names to read from a metadata table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataColumns {
    /// FOV identifier column
    pub fov: String,
    /// Object label column
    pub label: String,
    /// Centroid x column
    pub x: String,
    /// Centroid y column
    pub y: String,
    /// Cluster id column, if clusters are needed
    pub cluster: Option<String>,
    /// Marker expression columns
    pub markers: Vec<String>,
    /// Categorical columns kept as annotations
    pub annotations: Vec<String>,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV_COLUMN.to_string(),
            label: DEFAULT_LABEL_COLUMN.to_string(),
            x: DEFAULT_X_COLUMN.to_string(),
            y: DEFAULT_Y_COLUMN.to_string(),
            cluster: None,
            markers: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

// Header positions of the configured columns
struct ColumnIndex {
    fov: usize,
    label: usize,
    x: usize,
    y: usize,
    cluster: Option<usize>,
    markers: Vec<(String, usize)>,
    annotations: Vec<(String, usize)>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &MetadataColumns) -> Result<Self> {
        let find = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                invalid_arguments(
                    "columns",
                    &format!("column '{name}' does not exist in the metadata table"),
                )
            })
        };
        let named = |names: &[String]| -> Result<Vec<(String, usize)>> {
            names
                .iter()
                .map(|name| Ok((name.clone(), find(name.as_str())?)))
                .collect()
        };

        Ok(Self {
            fov: find(columns.fov.as_str())?,
            label: find(columns.label.as_str())?,
            x: find(columns.x.as_str())?,
            y: find(columns.y.as_str())?,
            cluster: columns.cluster.as_deref().map(&find).transpose()?,
            markers: named(&columns.markers)?,
            annotations: named(&columns.annotations)?,
        })
    }
}

// Integer ids, also accepting integral floats such as "12.0"
fn parse_id(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32)
    })
}

/// Read object records from a CSV metadata table
///
/// # Errors
///
/// Returns:
/// - `InvalidArguments` if a configured column is absent from the header
/// - `Metadata` if the file cannot be parsed or a value is malformed
pub fn read_object_metadata(path: &Path, columns: &MetadataColumns) -> Result<Vec<ObjectRecord>> {
    let metadata_error = |reason: String| EnrichmentError::Metadata {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| metadata_error(e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| metadata_error(e.to_string()))?
        .clone();
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| metadata_error(e.to_string()))?;
        // Row numbers are 1-based and skip the header
        let line = row + 2;
        let field = |position: usize| record.get(position).unwrap_or("");
        let number = |position: usize, column: &str| -> Result<f64> {
            field(position).parse::<f64>().map_err(|e| {
                metadata_error(format!("line {line}: column '{column}' is not a number: {e}"))
            })
        };

        let label: Label = parse_id(field(index.label)).ok_or_else(|| {
            metadata_error(format!(
                "line {line}: invalid object label '{}'",
                field(index.label)
            ))
        })?;
        let mut object = ObjectRecord::new(
            field(index.fov),
            label,
            (number(index.x, &columns.x)?, number(index.y, &columns.y)?),
        );

        if let Some(position) = index.cluster {
            let raw = field(position);
            if !raw.is_empty() {
                let cluster: ClusterId = parse_id(raw).ok_or_else(|| {
                    metadata_error(format!("line {line}: invalid cluster id '{raw}'"))
                })?;
                object = object.with_cluster(cluster);
            }
        }
        for (name, position) in &index.markers {
            object = object.with_expression(name.clone(), number(*position, name)?);
        }
        for (name, position) in &index.annotations {
            object = object.with_annotation(name.clone(), field(*position));
        }
        records.push(object);
    }

    tracing::debug!(path = %path.display(), objects = records.len(), "read object metadata");
    Ok(records)
}
