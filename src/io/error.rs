//! Error types and FOV context for enrichment operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all enrichment operations
#[derive(Debug)]
pub enum EnrichmentError {
    /// Analysis mode tag outside the recognized set (`cluster`, `channel`)
    InvalidAnalysisType {
        /// The rejected mode tag
        value: String,
    },

    /// Mode-specific inputs missing, empty or mismatched in length
    InvalidArguments {
        /// Name of the offending argument
        parameter: &'static str,
        /// Explanation of why the argument was rejected
        reason: String,
    },

    /// Malformed image, empty object set, unknown label or bad path
    InvalidInput {
        /// Description of what's wrong with the input
        reason: String,
    },

    /// Failed to load a label image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Object metadata table could not be parsed
    Metadata {
        /// Path to the metadata file
        path: PathBuf,
        /// Description of the parse failure
        reason: String,
    },

    /// Archive encoding or decoding failed
    Serialization {
        /// Path to the archive
        path: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A single FOV failed inside a batch
    FovFailed {
        /// Identifier of the failing FOV
        fov_id: String,
        /// Underlying cause
        source: Box<EnrichmentError>,
    },

    /// The FOV was skipped because the batch was cancelled
    Cancelled {
        /// Identifier of the skipped FOV
        fov_id: String,
    },
}

impl fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAnalysisType { value } => {
                write!(
                    f,
                    "Invalid analysis type '{value}': expected 'cluster' or 'channel'"
                )
            }
            Self::InvalidArguments { parameter, reason } => {
                write!(f, "Invalid arguments for '{parameter}': {reason}")
            }
            Self::InvalidInput { reason } => write!(f, "Invalid input: {reason}"),
            Self::ImageLoad { path, source } => {
                write!(
                    f,
                    "Failed to load label image '{}': {source}",
                    path.display()
                )
            }
            Self::Metadata { path, reason } => {
                write!(f, "Failed to read metadata '{}': {reason}", path.display())
            }
            Self::Serialization { path, reason } => {
                write!(f, "Archive error for '{}': {reason}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::FovFailed { fov_id, source } => write!(f, "FOV '{fov_id}' failed: {source}"),
            Self::Cancelled { fov_id } => write!(f, "FOV '{fov_id}' skipped: batch cancelled"),
        }
    }
}

impl std::error::Error for EnrichmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::FovFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Convenience type alias for enrichment results
pub type Result<T> = std::result::Result<T, EnrichmentError>;

impl From<std::io::Error> for EnrichmentError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Attaches the FOV identifier to errors raised while processing that FOV
pub trait WithFov<T> {
    /// Wrap the error in [`EnrichmentError::FovFailed`]
    ///
    /// # Errors
    ///
    /// Propagates the original error tagged with the FOV identifier
    fn with_fov(self, fov_id: &str) -> Result<T>;
}

impl<T, E> WithFov<T> for std::result::Result<T, E>
where
    E: Into<EnrichmentError>,
{
    fn with_fov(self, fov_id: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            // Already tagged errors keep their original FOV
            tagged @ (EnrichmentError::FovFailed { .. } | EnrichmentError::Cancelled { .. }) => {
                tagged
            }
            other => EnrichmentError::FovFailed {
                fov_id: fov_id.to_string(),
                source: Box::new(other),
            },
        })
    }
}

impl EnrichmentError {
    /// Identifier of the FOV this error belongs to, if tagged
    pub fn fov_id(&self) -> Option<&str> {
        match self {
            Self::FovFailed { fov_id, .. } | Self::Cancelled { fov_id } => Some(fov_id),
            _ => None,
        }
    }

    /// Innermost error, skipping FOV tagging
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::FovFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Create an invalid arguments error
pub fn invalid_arguments(parameter: &'static str, reason: &impl ToString) -> EnrichmentError {
    EnrichmentError::InvalidArguments {
        parameter,
        reason: reason.to_string(),
    }
}

/// Create an invalid input error
pub fn invalid_input(reason: &impl ToString) -> EnrichmentError {
    EnrichmentError::InvalidInput {
        reason: reason.to_string(),
    }
}
