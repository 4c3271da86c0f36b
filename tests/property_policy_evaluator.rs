use ferroscan::domain::models::{Defect, Measurement, NominalDimensions, PolicyThresholds, Verdict};
use ferroscan::services::PolicyEvaluator;
use proptest::prelude::*;

fn defect_strategy() -> impl Strategy<Value = Defect> {
    (
        prop_oneof![
            Just("scratch".to_string()),
            Just("dent".to_string()),
            Just("crack".to_string()),
            Just("pit".to_string()),
        ],
        0.0f64..=1.0,
        0u32..640,
        0u32..480,
    )
        .prop_map(|(defect_type, confidence, x, y)| {
            Defect::new(defect_type, confidence, format!("({x}, {y}) 16x16"))
        })
}

fn measurement_strategy() -> impl Strategy<Value = Measurement> {
    (10.0f64..50.0, 5.0f64..25.0, proptest::option::of(-0.5f64..0.5)).prop_map(
        |(length, width, offset)| {
            let measurement = Measurement::new(length, width);
            match offset {
                Some(offset) => {
                    measurement.with_nominal(NominalDimensions::new(length - offset, width))
                }
                None => measurement,
            }
        },
    )
}

fn thresholds_strategy() -> impl Strategy<Value = PolicyThresholds> {
    (
        0.0f64..=1.0,
        0.0f64..0.5,
        proptest::collection::vec(
            prop_oneof![Just("scratch".to_string()), Just("crack".to_string())],
            0..3,
        ),
    )
        .prop_map(|(detection_accuracy, tolerance_mm, critical_types)| PolicyThresholds {
            detection_accuracy,
            tolerance_mm,
            critical_types,
        })
}

proptest! {
    /// Property: The evaluator is a pure function
    ///
    /// The same detection result, measurement and thresholds always
    /// produce the same verdict.
    #[test]
    fn prop_verdict_is_deterministic(
        defects in proptest::collection::vec(defect_strategy(), 0..6),
        measurement in proptest::option::of(measurement_strategy()),
        thresholds in thresholds_strategy(),
    ) {
        let first = PolicyEvaluator::evaluate(Some(&defects), measurement.as_ref(), &thresholds);
        let second = PolicyEvaluator::evaluate(Some(&defects), measurement.as_ref(), &thresholds);
        prop_assert_eq!(first, second);
    }

    /// Property: A confident defect always fails the part
    ///
    /// With an empty critical set every defect type counts, so any
    /// defect at or above the confidence threshold forces a failure no
    /// matter what else was detected or measured.
    #[test]
    fn prop_confident_defect_always_fails(
        mut defects in proptest::collection::vec(defect_strategy(), 0..5),
        detection_accuracy in 0.0f64..=1.0,
        margin in 0.0f64..=1.0,
        measurement in proptest::option::of(measurement_strategy()),
    ) {
        let confidence = detection_accuracy + (1.0 - detection_accuracy) * margin;
        defects.push(Defect::new("scratch", confidence, "(0, 0) 16x16"));
        let thresholds = PolicyThresholds {
            detection_accuracy,
            critical_types: vec![],
            ..PolicyThresholds::default()
        };

        let verdict = PolicyEvaluator::evaluate(Some(&defects), measurement.as_ref(), &thresholds);
        prop_assert_eq!(verdict, Verdict::Failed,
            "defect with confidence {} at threshold {} must fail",
            confidence, detection_accuracy);
    }

    /// Property: A passed verdict certifies every acceptance criterion
    ///
    /// Whenever the evaluator says Passed, no critical defect reaches
    /// the confidence threshold and the measurement sits within
    /// tolerance.
    #[test]
    fn prop_passed_implies_no_violation(
        defects in proptest::collection::vec(defect_strategy(), 0..6),
        measurement in proptest::option::of(measurement_strategy()),
        thresholds in thresholds_strategy(),
    ) {
        let verdict = PolicyEvaluator::evaluate(Some(&defects), measurement.as_ref(), &thresholds);
        if verdict == Verdict::Passed {
            for defect in &defects {
                prop_assert!(
                    !thresholds.is_critical_type(&defect.defect_type)
                        || defect.confidence < thresholds.detection_accuracy,
                    "passed despite critical defect {:?} at threshold {}",
                    defect, thresholds.detection_accuracy,
                );
            }
            if let Some(m) = &measurement {
                prop_assert!(m.within_tolerance(thresholds.tolerance_mm));
            }
        }
    }

    /// Property: No data means no judgement
    ///
    /// With both stage results absent the verdict is Undetermined under
    /// every threshold configuration.
    #[test]
    fn prop_both_absent_is_undetermined(thresholds in thresholds_strategy()) {
        let verdict = PolicyEvaluator::evaluate(None, None, &thresholds);
        prop_assert_eq!(verdict, Verdict::Undetermined);
    }

    /// Property: Raising the confidence threshold never fails more parts
    ///
    /// A part that passes detection at one threshold also passes at any
    /// stricter (higher) threshold.
    #[test]
    fn prop_raising_accuracy_is_monotone(
        defects in proptest::collection::vec(defect_strategy(), 0..6),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let (lower, higher) = if a <= b { (a, b) } else { (b, a) };
        let lenient = PolicyThresholds {
            detection_accuracy: lower,
            ..PolicyThresholds::default()
        };
        let strict = PolicyThresholds {
            detection_accuracy: higher,
            ..PolicyThresholds::default()
        };

        if PolicyEvaluator::evaluate(Some(&defects), None, &lenient) == Verdict::Passed {
            prop_assert_eq!(
                PolicyEvaluator::evaluate(Some(&defects), None, &strict),
                Verdict::Passed,
            );
        }
    }

    /// Property: Defect ordering carries no meaning
    ///
    /// Detectors return defects in arbitrary order; the verdict must not
    /// depend on it.
    #[test]
    fn prop_defect_order_is_irrelevant(
        defects in proptest::collection::vec(defect_strategy(), 0..6),
        measurement in proptest::option::of(measurement_strategy()),
        thresholds in thresholds_strategy(),
    ) {
        let forward = PolicyEvaluator::evaluate(Some(&defects), measurement.as_ref(), &thresholds);
        let reversed: Vec<Defect> = defects.iter().rev().cloned().collect();
        let backward = PolicyEvaluator::evaluate(Some(&reversed), measurement.as_ref(), &thresholds);
        prop_assert_eq!(forward, backward);
    }
}
