//! Input/output, CLI plumbing and error handling

/// Distance matrix and statistics archives
pub mod archive;
/// Command-line interface and batch file processing
pub mod cli;
/// Defaults and constants
pub mod configuration;
/// Error types
pub mod error;
/// Label image loading
pub mod label_image;
/// Tracing subscriber setup
pub mod logging;
/// Object metadata tables
pub mod metadata;
/// Batch progress display
pub mod progress;
