//! Single-FOV enrichment analysis from distances and object metadata

use crate::io::configuration::{DEFAULT_BOOTSTRAP_NUM, DEFAULT_DIST_LIM, DEFAULT_SEED};
use crate::io::error::{Result, WithFov, invalid_arguments};
use crate::proximity::counter::{ProximityCountMatrix, count_with_mask};
use crate::proximity::mask::{ProximityMask, validate_dist_lim};
use crate::proximity::positivity::{PositiveSets, PositivitySelector};
use crate::sampling::context::{ContextFilter, SamplingPool};
use crate::sampling::null::{NullSampler, NullTensor, ResamplingStrategy};
use crate::sampling::streams::fov_seed;
use crate::spatial::distance::DistanceMatrix;
use crate::spatial::labels::FovId;
use crate::spatial::objects::ObjectRecord;
use crate::stats::enrichment::{EnrichmentResult, calculate_enrichment_stats};
use crate::stats::multitest::MultipleTesting;

/// Parameters shared by every FOV of a run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Distance below which two objects are close
    pub dist_lim: f64,
    /// Draws per null distribution
    pub bootstrap_num: usize,
    /// Null resampling strategy
    pub strategy: ResamplingStrategy,
    /// Multiple-testing correction
    pub correction: MultipleTesting,
    /// Run seed; each FOV derives its own stream from it
    pub seed: u64,
    /// Optional restriction of the resampling pool
    pub context: Option<ContextFilter>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dist_lim: DEFAULT_DIST_LIM,
            bootstrap_num: DEFAULT_BOOTSTRAP_NUM,
            strategy: ResamplingStrategy::default(),
            correction: MultipleTesting::default(),
            seed: DEFAULT_SEED,
            context: None,
        }
    }
}

impl AnalysisConfig {
    /// Check the parameters before any FOV is touched
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if `dist_lim` is not finite and positive,
    /// `bootstrap_num` is zero or the context filter lists no cell types
    pub fn validate(&self) -> Result<()> {
        validate_dist_lim(self.dist_lim)?;
        if self.bootstrap_num == 0 {
            return Err(invalid_arguments(
                "bootstrap_num",
                &"at least one bootstrap draw is required",
            ));
        }
        if let Some(context) = &self.context {
            if context.cell_types.is_empty() {
                return Err(invalid_arguments(
                    "cell_types",
                    &"context-aware sampling needs at least one cell type",
                ));
            }
        }
        Ok(())
    }
}

/// Everything known about one FOV before analysis
#[derive(Debug, Clone)]
pub struct FovInput {
    /// FOV identifier
    pub fov_id: FovId,
    /// Label-indexed pairwise distances
    pub distances: DistanceMatrix,
    /// Object metadata of this FOV
    pub objects: Vec<ObjectRecord>,
}

/// Intermediate and final results for one FOV
#[derive(Debug, Clone)]
pub struct FovAnalysis {
    /// FOV identifier
    pub fov_id: FovId,
    /// Positive sets used for counting
    pub sets: PositiveSets,
    /// Observed close-pair counts
    pub close_counts: ProximityCountMatrix,
    /// Null distribution draws
    pub null: NullTensor,
    /// Enrichment statistics
    pub result: EnrichmentResult,
}

/// Run the full enrichment analysis on one FOV
///
/// The null distribution is seeded from the run seed and the FOV id, so the
/// result does not depend on which other FOVs are analyzed alongside.
///
/// # Errors
///
/// Any failure is returned as `FovFailed` carrying the FOV id and the cause
pub fn analyze_fov<S>(
    input: &FovInput,
    selector: &S,
    config: &AnalysisConfig,
) -> Result<FovAnalysis>
where
    S: PositivitySelector + ?Sized,
{
    run_stages(input, selector, config).with_fov(&input.fov_id)
}

fn run_stages<S>(input: &FovInput, selector: &S, config: &AnalysisConfig) -> Result<FovAnalysis>
where
    S: PositivitySelector + ?Sized,
{
    let mask = ProximityMask::new(&input.distances, config.dist_lim)?;
    let sets = selector.select(&input.objects)?;
    let close_counts = count_with_mask(&input.distances, &mask, &sets)?;

    let pool = match &config.context {
        Some(filter) => filter.pool(&input.objects, &input.distances)?,
        None => SamplingPool::All,
    };
    let sampler = NullSampler::new(
        config.strategy,
        config.bootstrap_num,
        fov_seed(config.seed, &input.fov_id),
    )?;
    let null = sampler.sample(&sets.sizes(), &mask, &pool)?;
    let result = calculate_enrichment_stats(&close_counts, &null, &config.correction)?;

    tracing::debug!(
        fov = %input.fov_id,
        objects = input.distances.len(),
        markers = sets.len(),
        "analyzed FOV"
    );
    Ok(FovAnalysis {
        fov_id: input.fov_id.clone(),
        sets,
        close_counts,
        null,
        result,
    })
}
