//! Tests for object metadata tables

#[cfg(test)]
mod tests {
    use spatialenrich::EnrichmentError;
    use spatialenrich::io::metadata::{MetadataColumns, read_object_metadata};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_table(contents: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cells.csv");
        std::fs::write(&path, contents).expect("write table");
        (dir, path)
    }

    fn full_columns() -> MetadataColumns {
        MetadataColumns {
            cluster: Some("FlowSOM_ID".to_string()),
            markers: vec!["CD8".to_string()],
            annotations: vec!["lineage".to_string()],
            ..MetadataColumns::default()
        }
    }

    // Tests every configured column lands in the record
    // Verified by swapping the x and y columns
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_read_records() {
        let (_dir, path) = write_table(
            "SampleID,cellLabelInImage,centroid_x,centroid_y,FlowSOM_ID,CD8,lineage\n\
             fov1, 3, 1.5, 2.5, 7, 0.25, immune\n\
             fov2,4.0,0,0,,1,tumor\n",
        );

        let records = read_object_metadata(&path, &full_columns()).expect("valid table");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fov_id, "fov1");
        assert_eq!(records[0].label, 3);
        assert_eq!(records[0].centroid, (1.5, 2.5));
        assert_eq!(records[0].cluster_id, Some(7));
        assert_eq!(records[0].expression.get("CD8"), Some(&0.25));
        assert_eq!(
            records[0].annotations.get("lineage").map(String::as_str),
            Some("immune")
        );
        assert_eq!(records[1].label, 4);
        assert_eq!(records[1].cluster_id, None);
    }

    // Tests missing columns are argument errors
    // Verified by reading missing columns as empty
    #[test]
    fn test_missing_column() {
        let (_dir, path) = write_table("SampleID,cellLabelInImage,centroid_x,centroid_y\nf,1,0,0\n");
        let result = read_object_metadata(&path, &full_columns());
        assert!(matches!(
            result,
            Err(EnrichmentError::InvalidArguments {
                parameter: "columns",
                ..
            })
        ));

        let records =
            read_object_metadata(&path, &MetadataColumns::default()).expect("core columns present");
        assert_eq!(records.len(), 1);
    }

    // Tests malformed values report their line
    // Verified by skipping unparsable rows
    #[test]
    fn test_malformed_values() {
        let (_dir, path) = write_table(
            "SampleID,cellLabelInImage,centroid_x,centroid_y\nf,1,0,0\nf,2,abc,0\n",
        );
        let error = read_object_metadata(&path, &MetadataColumns::default())
            .expect_err("x is not a number");
        assert!(matches!(error, EnrichmentError::Metadata { .. }));
        assert!(error.to_string().contains("line 3"));

        let (_dir, path) =
            write_table("SampleID,cellLabelInImage,centroid_x,centroid_y\nf,1.5,0,0\n");
        assert!(read_object_metadata(&path, &MetadataColumns::default()).is_err());
    }

    // Tests a missing file is a metadata error
    // Verified by panicking on open failure
    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = read_object_metadata(&dir.path().join("absent.csv"), &MetadataColumns::default());
        assert!(matches!(result, Err(EnrichmentError::Metadata { .. })));
    }
}
