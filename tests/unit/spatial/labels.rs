//! Tests for label images and centroid extraction

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use spatialenrich::EnrichmentError;
    use spatialenrich::spatial::{Centroid, LabeledImage};

    // Tests centroids are pixel means in ascending label order
    // Verified by iterating labels in pixel order
    #[test]
    fn test_centroids_are_pixel_means() {
        let image = LabeledImage::new(array![[0, 3, 3], [0, 0, 0], [1, 1, 0], [1, 1, 0],]);

        let centroids = image.centroids();

        assert_eq!(centroids.len(), 2);
        assert_eq!(centroids[0].label, 1);
        assert!((centroids[0].row - 2.5).abs() < 1e-12);
        assert!((centroids[0].col - 0.5).abs() < 1e-12);
        assert_eq!(centroids[0].area, 4);
        assert_eq!(centroids[1].label, 3);
        assert!((centroids[1].row - 0.0).abs() < 1e-12);
        assert!((centroids[1].col - 1.5).abs() < 1e-12);
    }

    // Tests background pixels are never objects
    // Verified by including label zero
    #[test]
    fn test_labels_skip_background() {
        let image = LabeledImage::new(array![[0, 7, 0], [2, 7, 0]]);
        assert_eq!(image.labels(), vec![2, 7]);

        let empty = LabeledImage::new(Array2::zeros((4, 4)));
        assert!(empty.labels().is_empty());
        assert!(empty.centroids().is_empty());
    }

    // Tests conversion from narrower and wider unsigned grids
    // Verified by truncating out-of-range values
    #[test]
    fn test_from_raw_range_check() {
        let narrow: Array2<u16> = array![[0, 65_535]];
        let image = LabeledImage::from_raw(&narrow).expect("u16 labels fit");
        assert_eq!(image.labels(), vec![65_535]);

        let wide: Array2<u64> = array![[1, u64::from(u32::MAX) + 1]];
        let result = LabeledImage::from_raw(&wide);
        assert!(matches!(result, Err(EnrichmentError::InvalidInput { .. })));
    }

    // Tests Euclidean distance between centroids
    // Verified by using squared distance
    #[test]
    fn test_centroid_distance() {
        let a = Centroid {
            label: 1,
            row: 0.0,
            col: 20.0,
            area: 1,
        };
        let b = Centroid {
            label: 2,
            row: 4.0,
            col: 17.0,
            area: 1,
        };
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert!((b.distance_to(&a) - 5.0).abs() < 1e-12);
    }
}
