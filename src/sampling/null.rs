//! Null distributions of close-pair counts by resampling

use crate::io::error::{EnrichmentError, Result, invalid_arguments, invalid_input};
use crate::proximity::counter::upper_triangle_pairs;
use crate::proximity::mask::{ProximityMask, ensure_non_empty};
use crate::sampling::context::SamplingPool;
use crate::sampling::streams::pair_rng;
use crate::spatial::distance::DistanceMatrix;
use ndarray::{Array3, ArrayView1, Axis};
use rand::Rng;
use rand_distr::{Binomial, Distribution};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// How surrogate close counts are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResamplingStrategy {
    /// Draw binary proximity indicators with replacement from the whole
    /// binarized matrix; only the global proximity rate matters
    #[default]
    Value,
    /// Draw object labels with replacement and re-slice the matrix, keeping
    /// the empirical spatial layout
    Label,
}

impl ResamplingStrategy {
    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for ResamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResamplingStrategy {
    type Err = EnrichmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "value" => Ok(Self::Value),
            "label" => Ok(Self::Label),
            other => Err(invalid_arguments(
                "strategy",
                &format!("unknown resampling strategy '{other}', expected 'value' or 'label'"),
            )),
        }
    }
}

/// `M x M x B` surrogate counts, symmetric over the first two axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullTensor {
    values: Array3<u64>,
}

impl NullTensor {
    /// Wrap raw surrogate counts
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if the first two axes differ in length or the
    /// tensor is not symmetric across them
    pub fn from_values(values: Array3<u64>) -> Result<Self> {
        let (m, m2, _) = values.dim();
        if m != m2 {
            return Err(invalid_arguments(
                "null",
                &format!("null tensor must be square in its first two axes, got {m}x{m2}"),
            ));
        }
        for (j, k) in upper_triangle_pairs(m) {
            if pair_draws(&values, j, k) != pair_draws(&values, k, j) {
                return Err(invalid_arguments(
                    "null",
                    &format!("null tensor is not symmetric at ({j}, {k})"),
                ));
            }
        }
        Ok(Self { values })
    }

    /// Tensor shape as (M, M, B)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Number of markers/clusters
    pub fn markers(&self) -> usize {
        self.values.dim().0
    }

    /// Number of bootstrap draws
    pub fn bootstrap_num(&self) -> usize {
        self.values.dim().2
    }

    /// Raw tensor
    pub const fn values(&self) -> &Array3<u64> {
        &self.values
    }

    /// Surrogate counts of pair (j, k)
    pub fn draws(&self, j: usize, k: usize) -> Option<ArrayView1<'_, u64>> {
        let (m, _, _) = self.values.dim();
        (j < m && k < m).then(|| pair_draws(&self.values, j, k))
    }
}

fn pair_draws(values: &Array3<u64>, j: usize, k: usize) -> ArrayView1<'_, u64> {
    values.index_axis(Axis(0), j).index_axis_move(Axis(0), k)
}

/// Generates null distributions of close-pair counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullSampler {
    strategy: ResamplingStrategy,
    bootstrap_num: usize,
    seed: u64,
}

impl NullSampler {
    /// Create a sampler
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if `bootstrap_num` is zero
    pub fn new(strategy: ResamplingStrategy, bootstrap_num: usize, seed: u64) -> Result<Self> {
        if bootstrap_num == 0 {
            return Err(invalid_arguments(
                "bootstrap_num",
                &"at least one bootstrap draw is required",
            ));
        }
        Ok(Self {
            strategy,
            bootstrap_num,
            seed,
        })
    }

    /// Resampling strategy in use
    pub const fn strategy(&self) -> ResamplingStrategy {
        self.strategy
    }

    /// Draws per marker pair
    pub const fn bootstrap_num(&self) -> usize {
        self.bootstrap_num
    }

    /// Draw the null tensor for the given positive-set sizes
    ///
    /// Each unordered pair (j, k) uses its own generator derived from the seed,
    /// and its draws are mirrored to (k, j).
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidInput` if the mask covers no objects
    /// - `InvalidArguments` if a restricted pool is empty or refers outside the mask
    pub fn sample(
        &self,
        set_sizes: &[usize],
        mask: &ProximityMask,
        pool: &SamplingPool,
    ) -> Result<NullTensor> {
        ensure_non_empty(mask)?;
        let pool_size = pool.size(mask.len());
        if pool_size == 0 {
            return Err(invalid_arguments("pool", &"sampling pool is empty"));
        }
        if let SamplingPool::Restricted(positions) = pool {
            if positions.iter().any(|&p| p >= mask.len()) {
                return Err(invalid_arguments(
                    "pool",
                    &"sampling pool refers to positions outside the distance matrix",
                ));
            }
        }

        let m = set_sizes.len();
        let b = self.bootstrap_num;
        let close_rate = match self.strategy {
            ResamplingStrategy::Value => Some(close_rate(mask, pool)),
            ResamplingStrategy::Label => None,
        };

        let pair_draws: Vec<((usize, usize), Vec<u64>)> = upper_triangle_pairs(m)
            .into_par_iter()
            .map(|(j, k)| {
                let size_j = set_sizes.get(j).copied().unwrap_or(0);
                let size_k = set_sizes.get(k).copied().unwrap_or(0);
                let mut rng = pair_rng(self.seed, j, k);
                let draws = match close_rate {
                    Some(rate) => value_draws(size_j, size_k, rate, b, &mut rng),
                    None => Ok(label_draws(size_j, size_k, mask, pool, b, &mut rng)),
                };
                draws.map(|d| ((j, k), d))
            })
            .collect::<Result<_>>()?;

        let mut values = Array3::zeros((m, m, b));
        for ((j, k), draws) in pair_draws {
            for (r, &draw) in draws.iter().enumerate() {
                if let Some(cell) = values.get_mut([j, k, r]) {
                    *cell = draw;
                }
                if let Some(cell) = values.get_mut([k, j, r]) {
                    *cell = draw;
                }
            }
        }

        tracing::debug!(
            markers = m,
            bootstrap_num = b,
            strategy = %self.strategy,
            "sampled null distribution"
        );
        Ok(NullTensor { values })
    }

    /// Binarize a distance matrix and draw the null tensor over all objects
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidArguments` if `dist_lim` is not finite and positive
    /// - `InvalidInput` if the matrix covers no objects
    pub fn sample_distances(
        &self,
        set_sizes: &[usize],
        distances: &DistanceMatrix,
        dist_lim: f64,
    ) -> Result<NullTensor> {
        let mask = ProximityMask::new(distances, dist_lim)?;
        self.sample(set_sizes, &mask, &SamplingPool::All)
    }
}

// Fraction of close ordered pairs inside the pool x pool block
fn close_rate(mask: &ProximityMask, pool: &SamplingPool) -> f64 {
    let (ones, size) = match pool {
        SamplingPool::All => (mask.count_ones(), mask.len()),
        SamplingPool::Restricted(positions) => {
            let columns = mask.column_mask(positions);
            (mask.count_block(positions, &columns), positions.len())
        }
    };
    let cells = (size as f64) * (size as f64);
    (ones as f64 / cells).clamp(0.0, 1.0)
}

// The sum of n with-replacement draws from a 0/1 array with a fraction p of
// ones is Binomial(n, p), so each surrogate count is one binomial draw
fn value_draws<R: Rng>(
    size_j: usize,
    size_k: usize,
    rate: f64,
    bootstrap_num: usize,
    rng: &mut R,
) -> Result<Vec<u64>> {
    let trials = (size_j as u64).saturating_mul(size_k as u64);
    let binomial = Binomial::new(trials, rate)
        .map_err(|e| invalid_input(&format!("cannot build null distribution: {e}")))?;
    Ok((0..bootstrap_num).map(|_| binomial.sample(rng)).collect())
}

fn label_draws<R: Rng>(
    size_j: usize,
    size_k: usize,
    mask: &ProximityMask,
    pool: &SamplingPool,
    bootstrap_num: usize,
    rng: &mut R,
) -> Vec<u64> {
    let pool_size = pool.size(mask.len());
    let mut rows = Vec::with_capacity(size_j);
    let mut cols = Vec::with_capacity(size_k);
    (0..bootstrap_num)
        .map(|_| {
            rows.clear();
            cols.clear();
            rows.extend((0..size_j).filter_map(|_| pool.position(rng.random_range(0..pool_size))));
            cols.extend((0..size_k).filter_map(|_| pool.position(rng.random_range(0..pool_size))));
            mask.count_sampled(&rows, &cols)
        })
        .collect()
}

/// Draw value-resampled null counts straight from a distance matrix
///
/// # Errors
///
/// Returns:
/// - `InvalidArguments` if `bootstrap_num` is zero or `dist_lim` is invalid
/// - `InvalidInput` if the matrix covers no objects
pub fn compute_close_cell_num_random(
    marker_nums: &[usize],
    distances: &DistanceMatrix,
    dist_lim: f64,
    bootstrap_num: usize,
    seed: u64,
) -> Result<NullTensor> {
    NullSampler::new(ResamplingStrategy::Value, bootstrap_num, seed)?.sample_distances(
        marker_nums,
        distances,
        dist_lim,
    )
}
