//! CLI entry point for spatial proximity enrichment analysis

use clap::Parser;
use spatialenrich::io::cli::{BatchProcessor, Cli};
use spatialenrich::io::logging::init_logging;

fn main() -> spatialenrich::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let mut processor = BatchProcessor::new(cli);
    processor.process()?;
    Ok(())
}
