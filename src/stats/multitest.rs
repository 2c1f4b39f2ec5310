//! Family-wise and false-discovery-rate corrections of p-values

use crate::io::configuration::DEFAULT_ALPHA;
use crate::io::error::{EnrichmentError, Result, invalid_arguments};
use std::fmt;
use std::str::FromStr;

/// Multiple-testing correction procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CorrectionMethod {
    /// Step-down Šidák
    #[default]
    HolmSidak,
    /// Step-down Bonferroni
    Holm,
    /// Single-step Bonferroni
    Bonferroni,
    /// Single-step Šidák
    Sidak,
    /// Benjamini–Hochberg false discovery rate
    BenjaminiHochberg,
    /// Benjamini–Yekutieli false discovery rate under dependence
    BenjaminiYekutieli,
}

impl CorrectionMethod {
    /// Short method tag
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HolmSidak => "hs",
            Self::Holm => "holm",
            Self::Bonferroni => "bonferroni",
            Self::Sidak => "sidak",
            Self::BenjaminiHochberg => "fdr_bh",
            Self::BenjaminiYekutieli => "fdr_by",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionMethod {
    type Err = EnrichmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hs" | "holm-sidak" => Ok(Self::HolmSidak),
            "holm" => Ok(Self::Holm),
            "bonferroni" | "b" => Ok(Self::Bonferroni),
            "sidak" | "s" => Ok(Self::Sidak),
            "fdr_bh" | "bh" | "fdr_i" => Ok(Self::BenjaminiHochberg),
            "fdr_by" | "by" | "fdr_n" => Ok(Self::BenjaminiYekutieli),
            other => Err(invalid_arguments(
                "correction",
                &format!("unknown correction method '{other}'"),
            )),
        }
    }
}

/// Correction procedure at a family-wise (or FDR) level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultipleTesting {
    method: CorrectionMethod,
    alpha: f64,
}

impl Default for MultipleTesting {
    fn default() -> Self {
        Self {
            method: CorrectionMethod::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl MultipleTesting {
    /// Create a correction procedure
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if `alpha` is not strictly between 0 and 1
    pub fn new(method: CorrectionMethod, alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(invalid_arguments(
                "alpha",
                &format!("significance level must lie in (0, 1), got {alpha}"),
            ));
        }
        Ok(Self { method, alpha })
    }

    /// Correction method
    pub const fn method(&self) -> CorrectionMethod {
        self.method
    }

    /// Significance level
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Reject decisions and adjusted p-values, in input order
    ///
    /// NaN p-values are never rejected and keep a NaN adjusted value; the
    /// remaining values form the family.
    pub fn correct(&self, pvals: &[f64]) -> (Vec<bool>, Vec<f64>) {
        let mut reject = vec![false; pvals.len()];
        let mut adjusted = vec![f64::NAN; pvals.len()];

        let mut order: Vec<usize> = (0..pvals.len())
            .filter(|&i| pvals.get(i).is_some_and(|p| !p.is_nan()))
            .collect();
        order.sort_by(|&a, &b| {
            let pa = pvals.get(a).copied().unwrap_or(f64::NAN);
            let pb = pvals.get(b).copied().unwrap_or(f64::NAN);
            pa.total_cmp(&pb)
        });
        let sorted: Vec<f64> = order
            .iter()
            .filter_map(|&i| pvals.get(i).copied())
            .collect();

        let (sorted_reject, sorted_adjusted) = correct_sorted(self.method, self.alpha, &sorted);
        for ((&i, r), a) in order.iter().zip(sorted_reject).zip(sorted_adjusted) {
            if let Some(cell) = reject.get_mut(i) {
                *cell = r;
            }
            if let Some(cell) = adjusted.get_mut(i) {
                *cell = a;
            }
        }
        (reject, adjusted)
    }
}

// Works on ascending p-values
fn correct_sorted(method: CorrectionMethod, alpha: f64, sorted: &[f64]) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let nf = n as f64;
    match method {
        CorrectionMethod::Bonferroni => {
            let reject = sorted.iter().map(|&p| p <= alpha / nf).collect();
            let adjusted = sorted.iter().map(|&p| (p * nf).min(1.0)).collect();
            (reject, adjusted)
        }
        CorrectionMethod::Sidak => {
            let critical = -(nf.recip() * (-alpha).ln_1p()).exp_m1();
            let reject = sorted.iter().map(|&p| p <= critical).collect();
            let adjusted = sorted
                .iter()
                .map(|&p| (-(nf * (-p).ln_1p()).exp_m1()).min(1.0))
                .collect();
            (reject, adjusted)
        }
        CorrectionMethod::Holm => {
            let reject = step_down(sorted, |i| alpha / (n - i) as f64);
            let adjusted = running_max(sorted.iter().enumerate().map(|(i, &p)| (n - i) as f64 * p));
            (reject, adjusted)
        }
        CorrectionMethod::HolmSidak => {
            let reject = step_down(sorted, |i| {
                -(((n - i) as f64).recip() * (-alpha).ln_1p()).exp_m1()
            });
            let adjusted = running_max(
                sorted
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| -((n - i) as f64 * (-p).ln_1p()).exp_m1()),
            );
            (reject, adjusted)
        }
        CorrectionMethod::BenjaminiHochberg => step_up(sorted, alpha, 1.0),
        CorrectionMethod::BenjaminiYekutieli => {
            let harmonic: f64 = (1..=n).map(|i| (i as f64).recip()).sum();
            step_up(sorted, alpha, harmonic)
        }
    }
}

// Reject in order until the first p-value above its critical value
fn step_down(sorted: &[f64], critical: impl Fn(usize) -> f64) -> Vec<bool> {
    let mut accepting = false;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            accepting = accepting || p > critical(i);
            !accepting
        })
        .collect()
}

fn running_max(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut max = f64::NEG_INFINITY;
    values
        .map(|v| {
            max = max.max(v);
            max.min(1.0)
        })
        .collect()
}

// Reject everything up to the largest rank whose p-value passes its bound
fn step_up(sorted: &[f64], alpha: f64, dependence: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let ecdf = |i: usize| (i + 1) as f64 / n as f64 / dependence;

    let last_rejected = sorted
        .iter()
        .enumerate()
        .rev()
        .find(|&(i, &p)| p <= ecdf(i) * alpha)
        .map(|(i, _)| i);
    let reject = (0..n)
        .map(|i| last_rejected.is_some_and(|last| i <= last))
        .collect();

    let mut adjusted: Vec<f64> = sorted
        .iter()
        .enumerate()
        .map(|(i, &p)| p / ecdf(i))
        .collect();
    let mut min = f64::INFINITY;
    for value in adjusted.iter_mut().rev() {
        min = min.min(*value);
        *value = min.min(1.0);
    }
    (reject, adjusted)
}
