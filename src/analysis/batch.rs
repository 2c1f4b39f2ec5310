//! Best-effort analysis of many FOVs in parallel

use crate::analysis::pipeline::{AnalysisConfig, FovAnalysis, FovInput, analyze_fov};
use crate::io::error::{EnrichmentError, Result};
use crate::proximity::positivity::PositivitySelector;
use crate::spatial::labels::FovId;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that stops a batch from starting further FOVs
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; FOVs already running finish normally
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Test if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one FOV in a batch
#[derive(Debug)]
pub struct FovOutcome {
    /// FOV identifier
    pub fov_id: FovId,
    /// Analysis or the error that stopped it
    pub result: Result<FovAnalysis>,
}

/// Per-FOV outcomes in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<FovOutcome>,
}

impl BatchReport {
    /// All outcomes
    pub fn outcomes(&self) -> &[FovOutcome] {
        &self.outcomes
    }

    /// Consume the report
    pub fn into_outcomes(self) -> Vec<FovOutcome> {
        self.outcomes
    }

    /// Number of FOVs in the batch
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Test if the batch was empty
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successful analyses
    pub fn successes(&self) -> impl Iterator<Item = &FovAnalysis> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failures, cancelled FOVs included
    pub fn failures(&self) -> impl Iterator<Item = &EnrichmentError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Number of successful analyses
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Number of failed or cancelled FOVs
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// Analyze every FOV, isolating failures
///
/// # Errors
///
/// Returns `InvalidArguments` if the configuration is invalid; per-FOV errors
/// are collected in the report instead
pub fn run_batch<S>(
    inputs: &[FovInput],
    selector: &S,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<BatchReport>
where
    S: PositivitySelector + ?Sized,
{
    run_batch_with(inputs, selector, config, cancel, |_| {})
}

/// Analyze every FOV, calling `on_complete` as each one finishes
///
/// # Errors
///
/// Returns `InvalidArguments` if the configuration is invalid
pub fn run_batch_with<S, F>(
    inputs: &[FovInput],
    selector: &S,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    on_complete: F,
) -> Result<BatchReport>
where
    S: PositivitySelector + ?Sized,
    F: Fn(&FovOutcome) + Sync,
{
    config.validate()?;

    let outcomes: Vec<FovOutcome> = inputs
        .par_iter()
        .map(|input| {
            let result = if cancel.is_cancelled() {
                Err(EnrichmentError::Cancelled {
                    fov_id: input.fov_id.clone(),
                })
            } else {
                analyze_fov(input, selector, config)
            };
            let outcome = FovOutcome {
                fov_id: input.fov_id.clone(),
                result,
            };
            on_complete(&outcome);
            outcome
        })
        .collect();

    let report = BatchReport { outcomes };
    tracing::info!(
        fovs = report.len(),
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch finished"
    );
    Ok(report)
}
