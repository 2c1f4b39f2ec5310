//! Tracing subscriber setup for the command-line tool

use crate::io::configuration::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber
///
/// `RUST_LOG` takes precedence; otherwise the filter follows `verbosity`
/// (0 = default, 1 = debug, 2+ = trace). Installing twice is a no-op.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match (quiet, verbosity) {
            (true, _) => "spatialenrich=warn",
            (false, 0) => DEFAULT_LOG_FILTER,
            (false, 1) => "spatialenrich=debug",
            (false, _) => "spatialenrich=trace",
        })
    });

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("tracing subscriber already installed");
    }
}
