//! Analysis defaults and runtime configuration constants

// Defaults for the statistical parameters
/// Number of bootstrap draws forming each null distribution
pub const DEFAULT_BOOTSTRAP_NUM: usize = 1000;
/// Family-wise significance level for the multiple-testing correction
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Distance below which two objects count as close, in centroid units
pub const DEFAULT_DIST_LIM: f64 = 100.0;
/// Fixed seed for reproducible resampling
pub const DEFAULT_SEED: u64 = 42;

// Metadata column names used by the reference tables
/// Column holding the FOV identifier
pub const DEFAULT_FOV_COLUMN: &str = "SampleID";
/// Column holding the object label
pub const DEFAULT_LABEL_COLUMN: &str = "cellLabelInImage";
/// Column holding the cluster/phenotype id
pub const DEFAULT_CLUSTER_COLUMN: &str = "FlowSOM_ID";
/// Column holding the centroid x coordinate
pub const DEFAULT_X_COLUMN: &str = "centroid_x";
/// Column holding the centroid y coordinate
pub const DEFAULT_Y_COLUMN: &str = "centroid_y";

// Output settings
/// File name of the distance matrix archive
pub const DISTANCE_ARCHIVE_NAME: &str = "dist_matrices.json.gz";
/// File name of the enrichment statistics archive
pub const RESULTS_ARCHIVE_NAME: &str = "enrichment_stats.json.gz";
/// Label image extensions picked up from an input directory
pub const LABEL_IMAGE_EXTENSIONS: [&str; 3] = ["png", "tif", "tiff"];

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "spatialenrich=info";
