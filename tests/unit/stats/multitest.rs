//! Tests for multiple-testing correction

#[cfg(test)]
mod tests {
    use spatialenrich::EnrichmentError;
    use spatialenrich::stats::{CorrectionMethod, MultipleTesting};

    const FIVE: [f64; 5] = [0.01, 0.02, 0.03, 0.04, 0.05];

    fn correct(method: CorrectionMethod, pvals: &[f64]) -> (Vec<bool>, Vec<f64>) {
        MultipleTesting::new(method, 0.05)
            .expect("valid alpha")
            .correct(pvals)
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "expected {e}, got {a}");
        }
    }

    // Tests Holm-Sidak step-down on evenly spaced p-values
    // Verified by dropping the running maximum
    #[test]
    fn test_holm_sidak() {
        let (reject, adjusted) = correct(CorrectionMethod::HolmSidak, &FIVE);
        assert_eq!(reject, vec![true, false, false, false, false]);
        assert_close(
            &adjusted,
            &[0.049_009_95, 0.077_631_84, 0.087_327, 0.087_327, 0.087_327],
        );
    }

    // Tests Benjamini-Hochberg where the largest p-value passes
    // Verified by stepping down instead of up
    #[test]
    fn test_benjamini_hochberg_all_rejected() {
        let (reject, adjusted) = correct(CorrectionMethod::BenjaminiHochberg, &FIVE);
        assert!(reject.iter().all(|&r| r));
        assert_close(&adjusted, &[0.05; 5]);
    }

    // Tests Benjamini-Hochberg cumulative minimum from the top
    // Verified by taking the cumulative minimum from the bottom
    #[test]
    fn test_benjamini_hochberg_partial() {
        let pvals = [0.001, 0.008, 0.039, 0.041, 0.042, 0.06, 0.074, 0.205];
        let (reject, adjusted) = correct(CorrectionMethod::BenjaminiHochberg, &pvals);
        assert_eq!(
            reject,
            vec![true, true, false, false, false, false, false, false]
        );
        assert_close(
            &adjusted,
            &[0.008, 0.032, 0.0672, 0.0672, 0.0672, 0.08, 0.084_571, 0.205],
        );
    }

    // Tests Holm maps results back to input order
    // Verified by returning sorted results
    #[test]
    fn test_holm_unsorted_input() {
        let (reject, adjusted) = correct(CorrectionMethod::Holm, &[0.01, 0.04, 0.03]);
        assert_eq!(reject, vec![true, false, false]);
        assert_close(&adjusted, &[0.03, 0.06, 0.06]);
    }

    // Tests single-step procedures and clipping at one
    // Verified by leaving adjusted values unclipped
    #[test]
    fn test_single_step() {
        let (reject, adjusted) = correct(CorrectionMethod::Bonferroni, &[0.01, 0.02]);
        assert_eq!(reject, vec![true, true]);
        assert_close(&adjusted, &[0.02, 0.04]);

        let (_, clipped) = correct(CorrectionMethod::Bonferroni, &[0.6, 0.01]);
        assert_close(&clipped, &[1.0, 0.02]);

        let (reject, adjusted) = correct(CorrectionMethod::Sidak, &[0.01, 0.5]);
        assert_eq!(reject, vec![true, false]);
        assert_close(&adjusted, &[0.0199, 0.75]);
    }

    // Tests Benjamini-Yekutieli scales by the harmonic number
    // Verified by using the Benjamini-Hochberg bound
    #[test]
    fn test_benjamini_yekutieli() {
        let (reject, adjusted) = correct(CorrectionMethod::BenjaminiYekutieli, &FIVE);
        assert!(reject.iter().all(|&r| !r));
        assert_close(&adjusted, &[0.114_166_7; 5]);
    }

    // Tests NaN p-values stay outside the family
    // Verified by sorting NaN to the end of the family
    #[test]
    fn test_nan_excluded() {
        let (reject, adjusted) = correct(CorrectionMethod::Bonferroni, &[f64::NAN, 0.02, 0.01]);
        assert_eq!(reject, vec![false, true, true]);
        assert!(adjusted[0].is_nan());
        assert_close(&adjusted[1..], &[0.04, 0.02]);

        let (reject, adjusted) = correct(CorrectionMethod::HolmSidak, &[]);
        assert!(reject.is_empty() && adjusted.is_empty());
    }

    // Tests method tags and aliases
    // Verified by matching tags case-sensitively
    #[test]
    fn test_method_tags() {
        assert_eq!(CorrectionMethod::default(), CorrectionMethod::HolmSidak);
        for (tag, method) in [
            ("hs", CorrectionMethod::HolmSidak),
            ("HOLM", CorrectionMethod::Holm),
            ("fdr_bh", CorrectionMethod::BenjaminiHochberg),
            ("bh", CorrectionMethod::BenjaminiHochberg),
            ("by", CorrectionMethod::BenjaminiYekutieli),
            ("b", CorrectionMethod::Bonferroni),
            ("s", CorrectionMethod::Sidak),
        ] {
            assert_eq!(tag.parse::<CorrectionMethod>().ok(), Some(method));
        }
        assert_eq!(CorrectionMethod::BenjaminiHochberg.as_str(), "fdr_bh");
        assert!("tukey".parse::<CorrectionMethod>().is_err());
    }

    // Tests alpha must lie strictly inside the unit interval
    // Verified by accepting alpha = 1
    #[test]
    fn test_alpha_validation() {
        for alpha in [0.0, 1.0, -0.1, f64::NAN] {
            assert!(matches!(
                MultipleTesting::new(CorrectionMethod::Holm, alpha),
                Err(EnrichmentError::InvalidArguments { .. })
            ));
        }
        let default = MultipleTesting::default();
        assert_eq!(default.method(), CorrectionMethod::HolmSidak);
        assert!((default.alpha() - 0.05).abs() < f64::EPSILON);
    }
}
