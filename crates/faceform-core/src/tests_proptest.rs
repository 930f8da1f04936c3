use proptest::prelude::*;

/// Property-based checks for the ratio pipeline

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FaceAnalyzer;
    use crate::config::{ClassificationStrategy, ClassifierConfig};
    use crate::face_shape::{ShapeClassifier, MAX_CONFIDENCE, MIN_CONFIDENCE};
    use crate::landmarks::ImageDims;
    use crate::measurements::Measurements;
    use crate::ratios::{normalize, RatioTriple};
    use crate::test_support::symmetric_face;

    fn measurements() -> impl Strategy<Value = Measurements> {
        (
            20.0f32..600.0,
            30.0f32..600.0,
            15.0f32..600.0,
            40.0f32..900.0,
            10.0f32..200.0,
        )
            .prop_map(|(f, c, j, l, ipd)| Measurements::new(f, c, j, l, ipd))
    }

    fn scaled(m: &Measurements, k: f32) -> Measurements {
        Measurements::new(
            m.forehead_width * k,
            m.cheekbone_width * k,
            m.jaw_width * k,
            m.face_length * k,
            m.interpupillary_distance * k,
        )
    }

    // =========================================================================
    // Scale invariance
    // =========================================================================
    proptest! {
        #[test]
        fn test_ratios_invariant_under_scaling(m in measurements(), k in 0.1f32..20.0) {
            let (n1, r1) = normalize(&m).unwrap();
            let (n2, r2) = normalize(&scaled(&m, k)).unwrap();

            let close = |a: f32, b: f32| (a - b).abs() <= 1e-4 * a.abs().max(1.0);
            prop_assert!(close(r1.fc, r2.fc));
            prop_assert!(close(r1.fw_cw, r2.fw_cw));
            prop_assert!(close(r1.cw_jw, r2.cw_jw));
            prop_assert!(close(n1.face_length, n2.face_length));
            prop_assert!(close(n1.jaw_width, n2.jaw_width));
        }

        #[test]
        fn test_label_invariant_under_power_of_two_scaling(
            m in measurements(),
            k in prop::sample::select(vec![0.25f32, 0.5, 2.0, 4.0, 8.0]),
        ) {
            // Power-of-two scaling is exact in binary floating point
            let classifier = ShapeClassifier::new();
            let (n1, r1) = normalize(&m).unwrap();
            let (n2, r2) = normalize(&scaled(&m, k)).unwrap();
            let a = classifier.classify(&r1, &n1);
            let b = classifier.classify(&r2, &n2);
            prop_assert_eq!(a.shape, b.shape);
            prop_assert_eq!(a.confidence, b.confidence);
        }

        #[test]
        fn test_landmark_set_scaling_keeps_label(
            forehead in 120.0f32..260.0,
            cheek in 150.0f32..260.0,
            jaw in 100.0f32..260.0,
            length in 150.0f32..400.0,
            k in prop::sample::select(vec![0.5f32, 2.0, 4.0]),
        ) {
            let set = symmetric_face(forehead, cheek, jaw, length, 65.0);
            let analyzer = FaceAnalyzer::new();
            let a = analyzer
                .analyze_shape(Some(&set), ImageDims::new(600, 800), None)
                .unwrap();
            let dims = ImageDims::new((600.0 * k) as u32, (800.0 * k) as u32);
            let b = analyzer
                .analyze_shape(Some(&set.scaled(k)), dims, None)
                .unwrap();

            // Halving can push widths under the pixel floors
            if !a.source.is_fallback() && !b.source.is_fallback() {
                prop_assert_eq!(a.result.shape, b.result.shape);
                prop_assert_eq!(a.result.confidence, b.result.confidence);
            }
        }
    }

    // =========================================================================
    // Confidence bounds and total coverage
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_every_triple_gets_bounded_label(
            fc in 0.05f32..6.0,
            fw_cw in 0.05f32..4.0,
            cw_jw in 0.05f32..4.0,
            relative in any::<bool>(),
        ) {
            let config = ClassifierConfig {
                strategy: if relative {
                    ClassificationStrategy::RelativeScoring
                } else {
                    ClassificationStrategy::Cascade
                },
                ..Default::default()
            };
            let r = RatioTriple::new(fc, fw_cw, cw_jw).unwrap();
            let result = ShapeClassifier::with_config(&config).classify_ratios(&r);

            prop_assert!(result.confidence >= MIN_CONFIDENCE);
            prop_assert!(result.confidence <= MAX_CONFIDENCE);
            prop_assert!(!result.reasoning.is_empty());
            prop_assert_eq!(result.runner_up.is_some(), relative);
        }

        #[test]
        fn test_analyzer_never_fails_on_landmarks(
            forehead in 0.0f32..500.0,
            cheek in 0.0f32..500.0,
            jaw in 0.0f32..500.0,
            length in 0.0f32..500.0,
            ipd in 0.0f32..150.0,
        ) {
            let set = symmetric_face(forehead, cheek, jaw, length, ipd);
            let analysis = FaceAnalyzer::new()
                .analyze_shape(Some(&set), ImageDims::new(600, 800), None)
                .unwrap();
            prop_assert!(analysis.result.confidence >= MIN_CONFIDENCE);
            prop_assert!(analysis.result.confidence <= MAX_CONFIDENCE);
            prop_assert!(analysis.result.ratios.fc.is_finite());
        }
    }

    // =========================================================================
    // Fallback determinism
    // =========================================================================
    proptest! {
        #[test]
        fn test_fallback_deterministic_for_any_dims(w in 0u32..8000, h in 0u32..8000) {
            let analyzer = FaceAnalyzer::new();
            let dims = ImageDims::new(w, h);
            let a = analyzer.analyze_shape(None, dims, None).unwrap();
            let b = analyzer.analyze_shape(None, dims, None).unwrap();

            prop_assert_eq!(&a, &b);
            prop_assert!(a.source.is_fallback());
            prop_assert!(a.result.confidence >= MIN_CONFIDENCE);
        }
    }
}
