//! Tests for command-line parsing and analysis setup

#[cfg(test)]
mod tests {
    use clap::Parser;
    use ndarray::Array2;
    use spatialenrich::EnrichmentError;
    use spatialenrich::io::archive::load_enrichment_stats;
    use spatialenrich::io::cli::{BatchProcessor, Cli};
    use spatialenrich::io::configuration::{
        DEFAULT_BOOTSTRAP_NUM, DEFAULT_CLUSTER_COLUMN, DEFAULT_DIST_LIM, DEFAULT_SEED,
        DISTANCE_ARCHIVE_NAME, RESULTS_ARCHIVE_NAME,
    };
    use spatialenrich::io::label_image::save_label_image;
    use spatialenrich::proximity::{AnalysisType, PositivitySelector};
    use spatialenrich::sampling::ResamplingStrategy;
    use spatialenrich::spatial::LabeledImage;
    use spatialenrich::stats::CorrectionMethod;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("valid arguments")
    }

    // Tests CLI parsing with only the metadata table
    // Verified by changing default values to ensure defaults are used
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_cli_parse_minimal_args() {
        let cli = parse(&["program", "-m", "cells.csv", "--clusters", "1,2"]);

        assert_eq!(cli.label_dir, None);
        assert_eq!(cli.metadata, PathBuf::from("cells.csv"));
        assert_eq!(cli.mode, "cluster");
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.bootstrap, DEFAULT_BOOTSTRAP_NUM);
        assert_eq!(cli.dist_lim, DEFAULT_DIST_LIM);
        assert_eq!(cli.output, PathBuf::from("."));
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    // Tests CLI parsing with every analysis argument
    // Verified by dropping the comma delimiter on list arguments
    #[test]
    fn test_cli_parse_all_args() {
        let cli = parse(&[
            "program",
            "labels/",
            "--metadata",
            "cells.csv",
            "--mode",
            "channel",
            "--markers",
            "CD8,CD20",
            "--thresholds",
            "-0.5,1.5",
            "--dist-lim",
            "50",
            "-b",
            "200",
            "--alpha",
            "0.1",
            "--correction",
            "fdr_bh",
            "--strategy",
            "label",
            "-s",
            "7",
            "--context-column",
            "lineage",
            "--context-types",
            "tumor,immune",
            "-o",
            "out",
            "--save-distances",
            "-t",
            "2",
            "-vv",
        ]);

        assert_eq!(cli.label_dir, Some(PathBuf::from("labels/")));
        assert_eq!(cli.thresholds, Some(vec![-0.5, 1.5]));
        assert_eq!(
            cli.context_types,
            Some(vec!["tumor".to_string(), "immune".to_string()])
        );
        assert_eq!(cli.threads, Some(2));
        assert_eq!(cli.verbose, 2);
        assert!(cli.save_distances);

        let config = cli.analysis_config().expect("valid arguments");
        assert_eq!(config.bootstrap_num, 200);
        assert_eq!(config.seed, 7);
        assert_eq!(config.strategy, ResamplingStrategy::Label);
        assert_eq!(config.correction.method(), CorrectionMethod::BenjaminiHochberg);
        assert!(config.context.is_some());

        let selector = cli.selector().expect("valid selector");
        assert_eq!(selector.analysis_type(), AnalysisType::Channel);
        assert_eq!(selector.names(), vec!["CD8", "CD20"]);
    }

    // Tests threshold lists may start with a negative value
    // Verified by parsing the list as a flag
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_negative_threshold_list() {
        let cli = parse(&[
            "program",
            "-m",
            "c.csv",
            "--mode",
            "channel",
            "--markers",
            "CD8,CD20",
            "--thresholds",
            "-1,-2.5",
            "-q",
        ]);
        assert_eq!(cli.thresholds, Some(vec![-1.0, -2.5]));
        assert!(cli.quiet);
    }

    // Tests context arguments must come together
    // Verified by removing the requires relation
    #[test]
    fn test_context_requires_types() {
        let result =
            Cli::try_parse_from(["program", "-m", "c.csv", "--context-column", "lineage"]);
        assert!(result.is_err());
    }

    // Tests invalid analysis arguments surface as typed errors
    // Verified by defaulting unknown strategies to value
    #[test]
    fn test_invalid_analysis_arguments() {
        let cli = parse(&["program", "-m", "c.csv", "--strategy", "shuffle"]);
        assert!(matches!(
            cli.analysis_config(),
            Err(EnrichmentError::InvalidArguments { .. })
        ));

        let cli = parse(&["program", "-m", "c.csv", "-b", "0"]);
        assert!(cli.analysis_config().is_err());

        let cli = parse(&["program", "-m", "c.csv", "--alpha", "1.5"]);
        assert!(cli.analysis_config().is_err());

        let cli = parse(&["program", "-m", "c.csv", "--mode", "pixel"]);
        assert!(matches!(
            cli.selector(),
            Err(EnrichmentError::InvalidAnalysisType { .. })
        ));

        let cli = parse(&["program", "-m", "c.csv"]);
        assert!(matches!(
            cli.selector(),
            Err(EnrichmentError::InvalidArguments { .. })
        ));
    }

    // Tests the cluster column is only read in cluster mode
    // Verified by always requesting the cluster column
    #[test]
    fn test_metadata_columns() {
        let cli = parse(&[
            "program",
            "-m",
            "c.csv",
            "--context-column",
            "lineage",
            "--context-types",
            "tumor",
        ]);
        let columns = cli.metadata_columns();
        assert_eq!(columns.cluster.as_deref(), Some(DEFAULT_CLUSTER_COLUMN));
        assert_eq!(columns.annotations, vec!["lineage"]);

        let cli = parse(&["program", "-m", "c.csv", "--mode", "channel", "--markers", "CD8"]);
        let columns = cli.metadata_columns();
        assert_eq!(columns.cluster, None);
        assert_eq!(columns.markers, vec!["CD8"]);
    }

    // Tests progress display based on --quiet flag
    // Verified by inverting quiet flag logic
    #[test]
    fn test_should_show_progress() {
        let cli = parse(&["program", "-m", "c.csv"]);
        assert!(cli.should_show_progress());

        let cli = parse(&["program", "-m", "c.csv", "--quiet"]);
        assert!(!cli.should_show_progress());
    }

    // Tests a missing metadata file fails the run
    // Verified by skipping the metadata read
    #[test]
    fn test_process_missing_metadata() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.csv");
        let missing = missing.to_str().expect("utf-8 temp path");
        let cli = parse(&["program", "-m", missing, "--clusters", "1", "--quiet"]);
        let mut processor = BatchProcessor::new(cli);
        assert!(matches!(
            processor.process(),
            Err(EnrichmentError::Metadata { .. })
        ));
    }

    // Tests a full run from a metadata table writes the statistics archive
    // Verified by returning before the archive is written
    #[test]
    fn test_process_metadata_only() {
        let dir = tempfile::tempdir().expect("temp dir");
        let metadata = dir.path().join("cells.csv");
        let mut csv = String::from("SampleID,cellLabelInImage,centroid_x,centroid_y,FlowSOM_ID\n");
        for (label, x, cluster) in [(1, 0, 1), (2, 10, 1), (3, 500, 2), (4, 510, 2)] {
            csv.push_str(&format!("fovA,{label},{x},0,{cluster}\n"));
        }
        std::fs::write(&metadata, csv).expect("write metadata");
        let output = dir.path().join("results");

        let cli = parse(&[
            "program",
            "-m",
            metadata.to_str().expect("utf-8 temp path"),
            "--clusters",
            "1,2",
            "-b",
            "20",
            "-o",
            output.to_str().expect("utf-8 temp path"),
            "--save-distances",
            "--quiet",
        ]);
        let mut processor = BatchProcessor::new(cli);
        let summary = processor.process().expect("analysis succeeds");
        assert_eq!(summary.analyzed, vec!["fovA"]);
        assert!(summary.failures.is_empty());

        let stats = load_enrichment_stats(&output.join(RESULTS_ARCHIVE_NAME))
            .expect("archive readable");
        assert_eq!(stats["fovA"].names, vec!["1", "2"]);
        assert!(output.join(DISTANCE_ARCHIVE_NAME).is_file());
    }

    // Tests FOVs missing a label image or metadata rows are reported as failures
    // Verified by skipping unpaired FOVs with a warning
    #[test]
    fn test_process_reports_unpaired_fovs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let labels = dir.path().join("labels");
        std::fs::create_dir(&labels).expect("create label dir");
        let mut pixels = Array2::zeros((20, 20));
        pixels[[0, 0]] = 1;
        pixels[[0, 2]] = 2;
        pixels[[19, 17]] = 3;
        pixels[[19, 19]] = 4;
        let image = LabeledImage::new(pixels);
        save_label_image(&labels.join("fovA.png"), &image).expect("write fovA");
        save_label_image(&labels.join("fovB.png"), &image).expect("write fovB");

        let metadata = dir.path().join("cells.csv");
        let mut csv = String::from("SampleID,cellLabelInImage,centroid_x,centroid_y,FlowSOM_ID\n");
        for fov in ["fovA", "fovC"] {
            for (label, cluster) in [(1, 1), (2, 1), (3, 2), (4, 2)] {
                csv.push_str(&format!("{fov},{label},0,0,{cluster}\n"));
            }
        }
        std::fs::write(&metadata, csv).expect("write metadata");
        let output = dir.path().join("results");

        let cli = parse(&[
            "program",
            labels.to_str().expect("utf-8 temp path"),
            "-m",
            metadata.to_str().expect("utf-8 temp path"),
            "--clusters",
            "1,2",
            "-b",
            "20",
            "-o",
            output.to_str().expect("utf-8 temp path"),
            "--quiet",
        ]);
        let summary = BatchProcessor::new(cli).process().expect("fovA is analyzed");

        assert_eq!(summary.analyzed, vec!["fovA"]);
        let failed: Vec<&str> = summary
            .failures
            .iter()
            .filter_map(EnrichmentError::fov_id)
            .collect();
        assert_eq!(failed, vec!["fovB", "fovC"]);
        assert!(summary.failures.iter().all(|error| matches!(
            error.root_cause(),
            EnrichmentError::InvalidInput { .. }
        )));
    }
}
