//! Command-line interface for batch enrichment analysis of label images

use crate::analysis::batch::{CancellationToken, run_batch_with};
use crate::analysis::pipeline::{AnalysisConfig, FovInput};
use crate::io::archive::{save_distance_matrices, save_enrichment_stats};
use crate::io::configuration::{
    DEFAULT_ALPHA, DEFAULT_BOOTSTRAP_NUM, DEFAULT_CLUSTER_COLUMN, DEFAULT_DIST_LIM,
    DEFAULT_FOV_COLUMN, DEFAULT_LABEL_COLUMN, DEFAULT_SEED, DEFAULT_X_COLUMN, DEFAULT_Y_COLUMN,
};
use crate::io::error::{EnrichmentError, Result, WithFov, invalid_arguments, invalid_input};
use crate::io::label_image::{load_label_image, scan_label_dir};
use crate::io::metadata::{MetadataColumns, read_object_metadata};
use crate::io::progress::ProgressManager;
use crate::proximity::positivity::{AnalysisType, Selector};
use crate::sampling::context::ContextFilter;
use crate::spatial::distance::{DistanceMatrix, DistanceMatrixBuilder};
use crate::spatial::labels::FovId;
use crate::spatial::objects::{ClusterId, ObjectRecord, group_by_fov};
use crate::stats::multitest::MultipleTesting;
use clap::{ArgAction, Parser};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "spatialenrich")]
#[command(
    author,
    version,
    about = "Test whether marker-positive objects lie closer together than chance"
)]
/// Command-line arguments for the enrichment tool
pub struct Cli {
    /// Directory of label images named `<fov_id>.png|.tif|.tiff`; without it,
    /// distances come from the metadata centroids
    #[arg(value_name = "LABEL_DIR")]
    pub label_dir: Option<PathBuf>,

    /// Object metadata CSV
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Positivity mode: `cluster` or `channel`
    #[arg(long, default_value = "cluster")]
    pub mode: String,

    /// Cluster ids to compare (cluster mode)
    #[arg(long, value_delimiter = ',')]
    pub clusters: Option<Vec<ClusterId>>,

    /// Marker columns to threshold (channel mode)
    #[arg(long, value_delimiter = ',')]
    pub markers: Option<Vec<String>>,

    /// Positivity thresholds, one per marker (channel mode)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub thresholds: Option<Vec<f64>>,

    /// Distance below which two objects are close
    #[arg(long, default_value_t = DEFAULT_DIST_LIM)]
    pub dist_lim: f64,

    /// Bootstrap draws per null distribution
    #[arg(short, long, default_value_t = DEFAULT_BOOTSTRAP_NUM)]
    pub bootstrap: usize,

    /// Significance level of the multiple-testing correction
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Correction method: hs, holm, bonferroni, sidak, fdr_bh, fdr_by
    #[arg(long, default_value = "hs")]
    pub correction: String,

    /// Null resampling strategy: `value` or `label`
    #[arg(long, default_value = "value")]
    pub strategy: String,

    /// Random seed for reproducible null distributions
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Annotation column restricting the resampling pool
    #[arg(long, requires = "context_types")]
    pub context_column: Option<String>,

    /// Cell types in the context column eligible for resampling
    #[arg(long, value_delimiter = ',', requires = "context_column")]
    pub context_types: Option<Vec<String>>,

    /// FOV id column of the metadata
    #[arg(long, default_value = DEFAULT_FOV_COLUMN)]
    pub fov_column: String,

    /// Object label column of the metadata
    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    pub label_column: String,

    /// Centroid x column of the metadata
    #[arg(long, default_value = DEFAULT_X_COLUMN)]
    pub x_column: String,

    /// Centroid y column of the metadata
    #[arg(long, default_value = DEFAULT_Y_COLUMN)]
    pub y_column: String,

    /// Cluster id column of the metadata (cluster mode)
    #[arg(long, default_value = DEFAULT_CLUSTER_COLUMN)]
    pub cluster_column: String,

    /// Output directory for the archives
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Also write the distance matrix archive
    #[arg(long)]
    pub save_distances: bool,

    /// Worker threads (defaults to one per core)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Positivity selector for the requested mode
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnalysisType` or `InvalidArguments` per [`Selector::from_parts`]
    pub fn selector(&self) -> Result<Selector> {
        Selector::from_parts(
            &self.mode,
            self.clusters.clone(),
            self.markers.clone(),
            self.thresholds.clone(),
        )
    }

    /// Analysis parameters shared by every FOV
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if a parameter is out of range or unknown
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let context = match (&self.context_column, &self.context_types) {
            (Some(column), Some(types)) => Some(ContextFilter::new(column.clone(), types.clone())),
            (None, None) => None,
            _ => {
                return Err(invalid_arguments(
                    "context",
                    &"context column and context types must be given together",
                ));
            }
        };
        let config = AnalysisConfig {
            dist_lim: self.dist_lim,
            bootstrap_num: self.bootstrap,
            strategy: self.strategy.parse()?,
            correction: MultipleTesting::new(self.correction.parse()?, self.alpha)?,
            seed: self.seed,
            context,
        };
        config.validate()?;
        Ok(config)
    }

    /// Metadata columns required by the requested analysis
    pub fn metadata_columns(&self) -> MetadataColumns {
        let is_cluster = self.mode.parse::<AnalysisType>().ok() == Some(AnalysisType::Cluster);
        MetadataColumns {
            fov: self.fov_column.clone(),
            label: self.label_column.clone(),
            x: self.x_column.clone(),
            y: self.y_column.clone(),
            cluster: is_cluster.then(|| self.cluster_column.clone()),
            markers: self.markers.clone().unwrap_or_default(),
            annotations: self.context_column.iter().cloned().collect(),
        }
    }
}

/// Outcome of a command-line run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// FOVs with enrichment results, in id order
    pub analyzed: Vec<FovId>,
    /// Per-FOV failures, each tagged with its FOV id
    pub failures: Vec<EnrichmentError>,
}

/// Orchestrates loading, batch analysis and archiving with progress tracking
pub struct BatchProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl BatchProcessor {
    /// Create a new processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli
            .should_show_progress()
            .then(|| ProgressManager::new(false));

        Self {
            cli,
            progress_manager,
        }
    }

    /// Run the analysis described by the CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if arguments are invalid, inputs cannot be read, the
    /// archives cannot be written, or every FOV failed
    pub fn process(&mut self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let selector = self.cli.selector()?;
        let config = self.cli.analysis_config()?;
        self.configure_threads()?;

        let objects = read_object_metadata(&self.cli.metadata, &self.cli.metadata_columns())?;
        let (inputs, mut failures) = self.collect_inputs(group_by_fov(objects))?;

        std::fs::create_dir_all(&self.cli.output).map_err(|source| {
            EnrichmentError::FileSystem {
                path: self.cli.output.clone(),
                operation: "create output directory",
                source,
            }
        })?;
        if self.cli.save_distances {
            let matrices: BTreeMap<FovId, DistanceMatrix> = inputs
                .iter()
                .map(|input| (input.fov_id.clone(), input.distances.clone()))
                .collect();
            save_distance_matrices(&self.cli.output, &matrices)?;
        }

        if let Some(pm) = &mut self.progress_manager {
            pm.initialize(inputs.len());
        }
        let progress = self.progress_manager.as_ref();
        let cancel = CancellationToken::new();
        let report = run_batch_with(&inputs, &selector, &config, &cancel, |outcome| {
            if let Some(pm) = progress {
                pm.complete_fov(&outcome.fov_id, outcome.result.is_ok());
            }
        })?;
        if let Some(pm) = &self.progress_manager {
            pm.finish();
        }

        let mut results = BTreeMap::new();
        for outcome in report.into_outcomes() {
            match outcome.result {
                Ok(analysis) => {
                    results.insert(outcome.fov_id, analysis.result);
                }
                Err(error) => failures.push(error),
            }
        }
        for error in &failures {
            tracing::error!(fov = error.fov_id().unwrap_or("?"), "{error}");
        }

        if results.is_empty() {
            if let Some(first) = failures.into_iter().next() {
                return Err(first);
            }
            tracing::warn!("no FOVs to analyze");
            return Ok(RunSummary::default());
        }
        save_enrichment_stats(&self.cli.output, &results)?;

        tracing::info!(
            analyzed = results.len(),
            failed = failures.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "enrichment analysis complete"
        );
        Ok(RunSummary {
            analyzed: results.into_keys().collect(),
            failures,
        })
    }

    fn configure_threads(&self) -> Result<()> {
        let Some(threads) = self.cli.threads else {
            return Ok(());
        };
        if threads == 0 {
            return Err(invalid_arguments("threads", &"thread count must be positive"));
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| invalid_arguments("threads", &e))
    }

    // Pair each FOV's objects with its distances; FOVs missing either side or
    // whose distances cannot be built are reported as failures
    fn collect_inputs(
        &self,
        mut objects: BTreeMap<FovId, Vec<ObjectRecord>>,
    ) -> Result<(Vec<FovInput>, Vec<EnrichmentError>)> {
        let mut inputs = Vec::new();
        let mut failures = Vec::new();

        let Some(dir) = &self.cli.label_dir else {
            for (fov_id, records) in objects {
                match DistanceMatrix::from_records(&records).with_fov(&fov_id) {
                    Ok(distances) => inputs.push(FovInput {
                        fov_id,
                        distances,
                        objects: records,
                    }),
                    Err(error) => failures.push(error),
                }
            }
            return Ok((inputs, failures));
        };

        for (fov_id, path) in scan_label_dir(dir)? {
            let Some(records) = objects.remove(&fov_id) else {
                failures.push(unpaired_fov(&fov_id, "label image has no metadata rows"));
                continue;
            };
            match Self::image_distances(&path).with_fov(&fov_id) {
                Ok(distances) => inputs.push(FovInput {
                    fov_id,
                    distances,
                    objects: records,
                }),
                Err(error) => failures.push(error),
            }
        }
        failures.extend(
            objects
                .keys()
                .map(|fov_id| unpaired_fov(fov_id, "metadata rows have no label image")),
        );
        Ok((inputs, failures))
    }

    fn image_distances(path: &Path) -> Result<DistanceMatrix> {
        DistanceMatrixBuilder::build(&load_label_image(path)?)
    }
}

fn unpaired_fov(fov_id: &str, reason: &str) -> EnrichmentError {
    EnrichmentError::FovFailed {
        fov_id: fov_id.to_string(),
        source: Box::new(invalid_input(&reason)),
    }
}
