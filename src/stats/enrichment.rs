//! Enrichment statistics of observed close counts against the null tensor
//!
//! For every marker pair the null draws are summarized by a normal fit, the
//! observed count is turned into a z-score and two one-sided empirical
//! p-values, and the signed summary p-values are corrected for multiple
//! testing across all pairs.

use crate::io::error::{Result, invalid_arguments, invalid_input};
use crate::proximity::counter::ProximityCountMatrix;
use crate::sampling::null::NullTensor;
use crate::stats::multitest::MultipleTesting;
use ndarray::{Array2, ArrayView1};
use std::fmt;

/// Named layer of an [`EnrichmentResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Standardized observed count
    Z,
    /// Mean of the null draws
    MuHat,
    /// Population standard deviation of the null draws
    SigmaHat,
    /// Probability of a count at least as large under the null
    PPos,
    /// Probability of a smaller count under the null
    PNeg,
    /// `PPos` where z > 0, otherwise `PNeg`
    PSummary,
    /// Corrected summary p-value
    PAdjusted,
}

impl Statistic {
    /// All numeric layers in archive order
    pub const ALL: [Self; 7] = [
        Self::Z,
        Self::MuHat,
        Self::SigmaHat,
        Self::PPos,
        Self::PNeg,
        Self::PSummary,
        Self::PAdjusted,
    ];

    /// Layer name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Z => "z",
            Self::MuHat => "muhat",
            Self::SigmaHat => "sigmahat",
            Self::PPos => "p_pos",
            Self::PNeg => "p_neg",
            Self::PSummary => "p_summary",
            Self::PAdjusted => "p_adjusted",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marker pair whose null draws have zero variance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDegeneracy {
    /// Row index
    pub j: usize,
    /// Column index
    pub k: usize,
    /// Constant null value
    pub mu_hat: f64,
}

/// Per-pair enrichment statistics, one `M x M` layer per quantity
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    /// Marker/cluster names in row/column order
    pub names: Vec<String>,
    /// Z-scores
    pub z: Array2<f64>,
    /// Null means
    pub mu_hat: Array2<f64>,
    /// Null standard deviations
    pub sigma_hat: Array2<f64>,
    /// Upper-tail empirical p-values
    pub p_pos: Array2<f64>,
    /// Lower-tail empirical p-values
    pub p_neg: Array2<f64>,
    /// Signed summary p-values
    pub p_summary: Array2<f64>,
    /// Significance after multiple-testing correction
    pub significant: Array2<bool>,
    /// Corrected summary p-values
    pub p_adjusted: Array2<f64>,
    /// Pairs with zero null variance
    pub degenerate: Array2<bool>,
}

impl EnrichmentResult {
    /// Number of markers/clusters
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Test if there are no markers
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Numeric layer by statistic
    pub const fn layer(&self, stat: Statistic) -> &Array2<f64> {
        match stat {
            Statistic::Z => &self.z,
            Statistic::MuHat => &self.mu_hat,
            Statistic::SigmaHat => &self.sigma_hat,
            Statistic::PPos => &self.p_pos,
            Statistic::PNeg => &self.p_neg,
            Statistic::PSummary => &self.p_summary,
            Statistic::PAdjusted => &self.p_adjusted,
        }
    }

    /// Value of a statistic for a named marker pair
    pub fn get(&self, stat: Statistic, marker_j: &str, marker_k: &str) -> Option<f64> {
        let (j, k) = self.index(marker_j, marker_k)?;
        self.layer(stat).get([j, k]).copied()
    }

    /// Significance of a named marker pair
    pub fn is_significant(&self, marker_j: &str, marker_k: &str) -> Option<bool> {
        let (j, k) = self.index(marker_j, marker_k)?;
        self.significant.get([j, k]).copied()
    }

    /// Pairs flagged as degenerate, row-major
    pub fn degeneracies(&self) -> Vec<NumericDegeneracy> {
        self.degenerate
            .indexed_iter()
            .filter(|&(_, &flag)| flag)
            .map(|((j, k), _)| NumericDegeneracy {
                j,
                k,
                mu_hat: self.mu_hat.get([j, k]).copied().unwrap_or(f64::NAN),
            })
            .collect()
    }

    fn index(&self, marker_j: &str, marker_k: &str) -> Option<(usize, usize)> {
        let j = self.names.iter().position(|n| n == marker_j)?;
        let k = self.names.iter().position(|n| n == marker_k)?;
        Some((j, k))
    }
}

// Maximum-likelihood normal fit: mean and population standard deviation
fn normal_fit(draws: ArrayView1<'_, u64>) -> (f64, f64) {
    let b = draws.len() as f64;
    let mean = draws.iter().map(|&x| x as f64).sum::<f64>() / b;
    let variance = draws
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / b;
    (mean, variance.sqrt())
}

/// Compare observed close counts with their null distribution
///
/// # Errors
///
/// Returns:
/// - `InvalidArguments` if the count matrix and the null tensor disagree in shape
/// - `InvalidInput` if the null tensor holds no draws
pub fn calculate_enrichment_stats(
    observed: &ProximityCountMatrix,
    null: &NullTensor,
    correction: &MultipleTesting,
) -> Result<EnrichmentResult> {
    let m = observed.len();
    let (null_m, _, b) = null.dim();
    if null_m != m {
        return Err(invalid_arguments(
            "null",
            &format!("null tensor covers {null_m} markers but the count matrix has {m}"),
        ));
    }
    if b == 0 {
        return Err(invalid_input(&"null tensor contains no bootstrap draws"));
    }

    let mut z = Array2::from_elem((m, m), f64::NAN);
    let mut mu_hat = Array2::from_elem((m, m), f64::NAN);
    let mut sigma_hat = Array2::from_elem((m, m), f64::NAN);
    let mut p_pos = Array2::from_elem((m, m), f64::NAN);
    let mut p_neg = Array2::from_elem((m, m), f64::NAN);
    let mut p_summary = Array2::from_elem((m, m), f64::NAN);
    let mut degenerate = Array2::from_elem((m, m), false);
    let mut degenerate_pairs = 0usize;

    let denominator = (b + 1) as f64;
    for ((j, k), &obs) in observed.counts().indexed_iter() {
        let Some(draws) = null.draws(j, k) else {
            continue;
        };
        let (mu, sigma) = normal_fit(draws);
        let zscore = (obs as f64 - mu) / sigma;
        let at_least = draws.iter().filter(|&&x| x >= obs).count();
        let below = draws.iter().filter(|&&x| x < obs).count();
        let pos = (1 + at_least) as f64 / denominator;
        let neg = (1 + below) as f64 / denominator;

        let index = [j, k];
        if let Some(cell) = z.get_mut(index) {
            *cell = zscore;
        }
        if let Some(cell) = mu_hat.get_mut(index) {
            *cell = mu;
        }
        if let Some(cell) = sigma_hat.get_mut(index) {
            *cell = sigma;
        }
        if let Some(cell) = p_pos.get_mut(index) {
            *cell = pos;
        }
        if let Some(cell) = p_neg.get_mut(index) {
            *cell = neg;
        }
        if let Some(cell) = p_summary.get_mut(index) {
            *cell = if zscore > 0.0 { pos } else { neg };
        }
        if sigma == 0.0 {
            if let Some(cell) = degenerate.get_mut(index) {
                *cell = true;
            }
            degenerate_pairs += 1;
            tracing::debug!(j, k, observed = obs, mu_hat = mu, "degenerate null distribution");
        }
    }

    if degenerate_pairs > 0 {
        tracing::warn!(
            pairs = degenerate_pairs,
            "null distribution has zero variance; z-scores are not finite"
        );
    }

    let flat: Vec<f64> = p_summary.iter().copied().collect();
    let (reject, adjusted) = correction.correct(&flat);
    let significant = Array2::from_shape_vec((m, m), reject)
        .map_err(|e| invalid_input(&format!("cannot shape significance matrix: {e}")))?;
    let p_adjusted = Array2::from_shape_vec((m, m), adjusted)
        .map_err(|e| invalid_input(&format!("cannot shape adjusted p-values: {e}")))?;

    Ok(EnrichmentResult {
        names: observed.names().to_vec(),
        z,
        mu_hat,
        sigma_hat,
        p_pos,
        p_neg,
        p_summary,
        significant,
        p_adjusted,
        degenerate,
    })
}
