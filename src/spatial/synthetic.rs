//! Seedable synthetic spatial data with planted A–B proximity
//!
//! Both generators produce three object populations where type A objects are
//! on average closer to type B objects than to type C objects, giving a known
//! positive control for the enrichment pipeline.

use crate::io::error::{Result, invalid_arguments};
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::labels::{Label, LabeledImage};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

/// Population an object was generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKind {
    /// Population planted close to B
    A,
    /// Population planted close to A
    B,
    /// Background population
    C,
}

/// Number of objects generated per population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSizes {
    /// Number of A objects
    pub a: usize,
    /// Number of B objects
    pub b: usize,
    /// Number of C objects
    pub c: usize,
}

impl Default for PopulationSizes {
    fn default() -> Self {
        Self {
            a: 100,
            b: 100,
            c: 100,
        }
    }
}

/// Mean and standard deviation of a normal distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParams {
    /// Mean
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
}

impl NormalParams {
    fn distribution(self, parameter: &'static str) -> Result<Normal<f64>> {
        Normal::new(self.mean, self.std_dev).map_err(|e| invalid_arguments(parameter, &e))
    }
}

/// Generate a distance matrix directly from two distance distributions
///
/// A–B distances are drawn from `ab`; every other block from `background`.
/// Within-population blocks are symmetrized by averaging with their
/// transpose, all values are made non-negative and the diagonal is zeroed.
/// Labels run from 1 in A, B, C order.
///
/// # Errors
///
/// Returns `InvalidArguments` if a standard deviation is negative or not finite
pub fn direct_init_dist_matrix<R: Rng>(
    sizes: PopulationSizes,
    ab: NormalParams,
    background: NormalParams,
    rng: &mut R,
) -> Result<(DistanceMatrix, Vec<CellKind>)> {
    let ab_dist = ab.distribution("ab")?;
    let background_dist = background.distribution("background")?;

    let kinds: Vec<CellKind> = std::iter::repeat_n(CellKind::A, sizes.a)
        .chain(std::iter::repeat_n(CellKind::B, sizes.b))
        .chain(std::iter::repeat_n(CellKind::C, sizes.c))
        .collect();
    let n = kinds.len();

    let mut values = Array2::zeros((n, n));
    for (i, &kind_i) in kinds.iter().enumerate() {
        for (j, &kind_j) in kinds.iter().enumerate().skip(i + 1) {
            let cross_ab = matches!(
                (kind_i, kind_j),
                (CellKind::A, CellKind::B) | (CellKind::B, CellKind::A)
            );
            let d = if cross_ab {
                ab_dist.sample(rng).abs()
            } else if kind_i == kind_j {
                // Mirror of averaging a block with its transpose
                f64::midpoint(
                    background_dist.sample(rng).abs(),
                    background_dist.sample(rng).abs(),
                )
            } else {
                background_dist.sample(rng).abs()
            };
            if let Some(cell) = values.get_mut([i, j]) {
                *cell = d;
            }
            if let Some(cell) = values.get_mut([j, i]) {
                *cell = d;
            }
        }
    }

    let labels = (1..=n as Label).collect();
    Ok((DistanceMatrix::from_parts(labels, values)?, kinds))
}

/// Bivariate normal cloud used to place one population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCloud {
    /// Center as a fraction of (height, width)
    pub mean_factor: (f64, f64),
    /// Covariance `[[var_rr, cov_rc], [cov_rc, var_cc]]` in pixels squared
    pub covariance: [[f64; 2]; 2],
}

impl PointCloud {
    const fn isotropic(mean_factor: f64, variance: f64) -> Self {
        Self {
            mean_factor: (mean_factor, mean_factor),
            covariance: [[variance, 0.0], [0.0, variance]],
        }
    }
}

/// Parameters for [`point_init_label_image`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointInitConfig {
    /// Image size as (height, width)
    pub size: (usize, usize),
    /// Objects per population before clipping and deduplication
    pub sizes: PopulationSizes,
    /// Placement of A objects
    pub a: PointCloud,
    /// Placement of B objects
    pub b: PointCloud,
    /// Placement of C objects
    pub c: PointCloud,
}

impl Default for PointInitConfig {
    fn default() -> Self {
        Self {
            size: (1024, 1024),
            sizes: PopulationSizes::default(),
            a: PointCloud::isotropic(0.5, 200.0),
            b: PointCloud::isotropic(0.6, 200.0),
            c: PointCloud::isotropic(0.1, 200.0),
        }
    }
}

/// Rasterize random single-pixel objects into a label image
///
/// Points falling outside the image are dropped, as are pixels hit by more
/// than one point. Surviving pixels are labeled from 1 in ascending
/// (row, col) order, so the distance matrix built from the image lists them in
/// the same order as the returned kinds.
///
/// # Errors
///
/// Returns `InvalidArguments` if a covariance matrix is not positive definite
pub fn point_init_label_image<R: Rng>(
    config: &PointInitConfig,
    rng: &mut R,
) -> Result<(LabeledImage, Vec<CellKind>)> {
    let (height, width) = config.size;
    let mut hits: HashMap<(usize, usize), (CellKind, usize)> = HashMap::new();

    for (kind, cloud, count) in [
        (CellKind::A, config.a, config.sizes.a),
        (CellKind::B, config.b, config.sizes.b),
        (CellKind::C, config.c, config.sizes.c),
    ] {
        let mean = (
            height as f64 * cloud.mean_factor.0,
            width as f64 * cloud.mean_factor.1,
        );
        for (row, col) in sample_bivariate(mean, cloud.covariance, count, rng)? {
            // Truncation toward zero matches integer casting of the samples
            let (row, col) = (row.trunc(), col.trunc());
            if row < 0.0 || col < 0.0 || row >= height as f64 || col >= width as f64 {
                continue;
            }
            let entry = hits
                .entry((row as usize, col as usize))
                .or_insert((kind, 0));
            entry.1 += 1;
        }
    }

    let mut unique: Vec<((usize, usize), CellKind)> = hits
        .into_iter()
        .filter(|(_, (_, count))| *count == 1)
        .map(|(position, (kind, _))| (position, kind))
        .collect();
    unique.sort_unstable_by_key(|(position, _)| *position);

    let mut pixels = Array2::zeros((height, width));
    let mut kinds = Vec::with_capacity(unique.len());
    for (index, ((row, col), kind)) in unique.into_iter().enumerate() {
        if let Some(pixel) = pixels.get_mut([row, col]) {
            *pixel = index as Label + 1;
        }
        kinds.push(kind);
    }

    Ok((LabeledImage::new(pixels), kinds))
}

fn sample_bivariate<R: Rng>(
    mean: (f64, f64),
    covariance: [[f64; 2]; 2],
    count: usize,
    rng: &mut R,
) -> Result<Vec<(f64, f64)>> {
    let [[var_r, cov_rc], [_, var_c]] = covariance;
    if var_r <= 0.0 {
        return Err(invalid_arguments(
            "covariance",
            &"covariance matrix must be positive definite",
        ));
    }
    // Cholesky factor of the 2x2 covariance
    let l11 = var_r.sqrt();
    let l21 = cov_rc / l11;
    let l22_sq = l21.mul_add(-l21, var_c);
    if l22_sq <= 0.0 || !l22_sq.is_finite() {
        return Err(invalid_arguments(
            "covariance",
            &"covariance matrix must be positive definite",
        ));
    }
    let l22 = l22_sq.sqrt();

    let standard = Normal::new(0.0, 1.0).map_err(|e| invalid_arguments("covariance", &e))?;
    Ok((0..count)
        .map(|_| {
            let z1 = standard.sample(rng);
            let z2 = standard.sample(rng);
            (l11.mul_add(z1, mean.0), l21.mul_add(z1, l22.mul_add(z2, mean.1)))
        })
        .collect())
}
