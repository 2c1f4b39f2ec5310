//! Gzip-compressed JSON archives of distance matrices and statistics
//!
//! Both archives map FOV ids to their per-FOV payload. Matrices are stored as
//! nested row lists; non-finite statistics are stored as `null`.

use crate::io::configuration::{DISTANCE_ARCHIVE_NAME, RESULTS_ARCHIVE_NAME};
use crate::io::error::{EnrichmentError, Result, WithFov, invalid_input};
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::labels::{FovId, Label};
use crate::stats::enrichment::EnrichmentResult;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct DistanceRecord {
    labels: Vec<Label>,
    values: Vec<Vec<f64>>,
}

#[derive(Serialize, Deserialize)]
struct StatsRecord {
    names: Vec<String>,
    z: Vec<Vec<Option<f64>>>,
    muhat: Vec<Vec<Option<f64>>>,
    sigmahat: Vec<Vec<Option<f64>>>,
    p_pos: Vec<Vec<Option<f64>>>,
    p_neg: Vec<Vec<Option<f64>>>,
    p_summary: Vec<Vec<Option<f64>>>,
    p_adjusted: Vec<Vec<Option<f64>>>,
    significant: Vec<Vec<bool>>,
    degenerate: Vec<Vec<bool>>,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(invalid_input(&format!(
            "output directory '{}' does not exist",
            dir.display()
        )))
    }
}

fn write_archive<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    let file = File::create(path).map_err(|source| EnrichmentError::FileSystem {
        path: path.to_path_buf(),
        operation: "create archive",
        source,
    })?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, payload).map_err(|e| EnrichmentError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .map_err(|source| EnrichmentError::FileSystem {
            path: path.to_path_buf(),
            operation: "write archive",
            source,
        })
}

fn read_archive<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(invalid_input(&format!(
            "archive '{}' does not exist",
            path.display()
        )));
    }
    let file = File::open(path).map_err(|source| EnrichmentError::FileSystem {
        path: path.to_path_buf(),
        operation: "open archive",
        source,
    })?;
    serde_json::from_reader(GzDecoder::new(BufReader::new(file))).map_err(|e| {
        EnrichmentError::Serialization {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

fn to_rows<T: Copy, U>(matrix: &Array2<T>, convert: impl Fn(T) -> U) -> Vec<Vec<U>> {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| convert(v)).collect())
        .collect()
}

fn from_rows<T: Clone, U: Copy>(
    path: &Path,
    rows: &[Vec<U>],
    size: usize,
    convert: impl Fn(U) -> T,
) -> Result<Array2<T>> {
    if rows.len() != size || rows.iter().any(|row| row.len() != size) {
        return Err(EnrichmentError::Serialization {
            path: path.to_path_buf(),
            reason: format!("expected a {size}x{size} matrix"),
        });
    }
    let flat: Vec<T> = rows.iter().flatten().map(|&v| convert(v)).collect();
    Array2::from_shape_vec((size, size), flat).map_err(|e| EnrichmentError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Write all distance matrices to `dir/dist_matrices.json.gz`
///
/// # Errors
///
/// Returns:
/// - `InvalidInput` if `dir` does not exist
/// - `FileSystem` or `Serialization` if writing fails
pub fn save_distance_matrices(
    dir: &Path,
    matrices: &BTreeMap<FovId, DistanceMatrix>,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(DISTANCE_ARCHIVE_NAME);
    let payload: BTreeMap<&FovId, DistanceRecord> = matrices
        .iter()
        .map(|(fov_id, matrix)| {
            let record = DistanceRecord {
                labels: matrix.labels().to_vec(),
                values: to_rows(matrix.values(), |v| v),
            };
            (fov_id, record)
        })
        .collect();
    write_archive(&path, &payload)?;
    tracing::info!(path = %path.display(), fovs = matrices.len(), "saved distance matrices");
    Ok(path)
}

/// Read a distance matrix archive, revalidating every matrix
///
/// # Errors
///
/// Returns:
/// - `InvalidInput` if the archive does not exist
/// - `FileSystem` or `Serialization` if reading fails
/// - `FovFailed` wrapping `InvalidInput` if a stored matrix is malformed
pub fn load_distance_matrices(path: &Path) -> Result<BTreeMap<FovId, DistanceMatrix>> {
    let payload: BTreeMap<FovId, DistanceRecord> = read_archive(path)?;
    payload
        .into_iter()
        .map(|(fov_id, record)| {
            let size = record.labels.len();
            let values = from_rows(path, &record.values, size, |v| v)?;
            let matrix = DistanceMatrix::from_parts(record.labels, values).with_fov(&fov_id)?;
            Ok((fov_id, matrix))
        })
        .collect()
}

/// Write all enrichment statistics to `dir/enrichment_stats.json.gz`
///
/// # Errors
///
/// Returns:
/// - `InvalidInput` if `dir` does not exist
/// - `FileSystem` or `Serialization` if writing fails
pub fn save_enrichment_stats(
    dir: &Path,
    results: &BTreeMap<FovId, EnrichmentResult>,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(RESULTS_ARCHIVE_NAME);
    let payload: BTreeMap<&FovId, StatsRecord> = results
        .iter()
        .map(|(fov_id, result)| {
            let record = StatsRecord {
                names: result.names.clone(),
                z: to_rows(&result.z, finite),
                muhat: to_rows(&result.mu_hat, finite),
                sigmahat: to_rows(&result.sigma_hat, finite),
                p_pos: to_rows(&result.p_pos, finite),
                p_neg: to_rows(&result.p_neg, finite),
                p_summary: to_rows(&result.p_summary, finite),
                p_adjusted: to_rows(&result.p_adjusted, finite),
                significant: to_rows(&result.significant, |v| v),
                degenerate: to_rows(&result.degenerate, |v| v),
            };
            (fov_id, record)
        })
        .collect();
    write_archive(&path, &payload)?;
    tracing::info!(path = %path.display(), fovs = results.len(), "saved enrichment statistics");
    Ok(path)
}

/// Read an enrichment statistics archive; stored `null` values become NaN
///
/// # Errors
///
/// Returns `InvalidInput` if the archive does not exist, and `FileSystem` or
/// `Serialization` if reading fails or a layer is not square in the number
/// of stored names
pub fn load_enrichment_stats(path: &Path) -> Result<BTreeMap<FovId, EnrichmentResult>> {
    let payload: BTreeMap<FovId, StatsRecord> = read_archive(path)?;
    payload
        .into_iter()
        .map(|(fov_id, record)| {
            let m = record.names.len();
            let layer = |rows: &[Vec<Option<f64>>]| {
                from_rows(path, rows, m, |v: Option<f64>| v.unwrap_or(f64::NAN))
            };
            let result = EnrichmentResult {
                z: layer(&record.z)?,
                mu_hat: layer(&record.muhat)?,
                sigma_hat: layer(&record.sigmahat)?,
                p_pos: layer(&record.p_pos)?,
                p_neg: layer(&record.p_neg)?,
                p_summary: layer(&record.p_summary)?,
                p_adjusted: layer(&record.p_adjusted)?,
                significant: from_rows(path, &record.significant, m, |v| v)?,
                degenerate: from_rows(path, &record.degenerate, m, |v| v)?,
                names: record.names,
            };
            Ok((fov_id, result))
        })
        .collect()
}
