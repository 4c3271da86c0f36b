use crate::domain::models::{Defect, Measurement, PolicyThresholds, Verdict};

/// Deterministic pass/fail evaluation over finished stage results
///
/// Pure function of its inputs: same detection, measurement and
/// thresholds always produce the same verdict. Thresholds are snapshotted
/// by the caller at finalize time, so changing them never rewrites a
/// verdict already given.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Evaluate stage results against thresholds.
    ///
    /// # Arguments
    /// * `detection` - Defects found, `None` when the detection stage
    ///   produced no result. `Some(&[])` is a clean scan.
    /// * `measurement` - Dimensional result, `None` when unavailable
    /// * `thresholds` - Snapshot of the active thresholds
    ///
    /// # Returns
    /// * `Verdict::Failed` - A critical defect at or above the confidence
    ///   threshold, or a dimensional deviation over tolerance
    /// * `Verdict::Passed` - At least one input present and no failing
    ///   criterion holds
    /// * `Verdict::Undetermined` - Both inputs absent
    pub fn evaluate(
        detection: Option<&[Defect]>,
        measurement: Option<&Measurement>,
        thresholds: &PolicyThresholds,
    ) -> Verdict {
        if detection.is_none() && measurement.is_none() {
            return Verdict::Undetermined;
        }

        if Self::has_critical_defect(detection, thresholds)
            || Self::out_of_tolerance(measurement, thresholds)
        {
            return Verdict::Failed;
        }

        Verdict::Passed
    }

    /// A defect counts against the part when its type is critical and its
    /// confidence reaches the detection accuracy threshold.
    fn has_critical_defect(detection: Option<&[Defect]>, thresholds: &PolicyThresholds) -> bool {
        detection.is_some_and(|defects| {
            defects.iter().any(|defect| {
                thresholds.is_critical_type(&defect.defect_type)
                    && defect.confidence >= thresholds.detection_accuracy
            })
        })
    }

    /// A measurement counts against the part only when a deviation exists
    /// and exceeds tolerance. No nominal configured means no deviation.
    fn out_of_tolerance(measurement: Option<&Measurement>, thresholds: &PolicyThresholds) -> bool {
        measurement.is_some_and(|m| !m.within_tolerance(thresholds.tolerance_mm))
    }
}
