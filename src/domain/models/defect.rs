//! Defect detection record.

use serde::{Deserialize, Serialize};

/// A single surface defect reported by a detector.
///
/// Detectors return defects in their own ranking order; the ordering is
/// not stable across runs and carries no semantics beyond presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    /// Detector-specific class, e.g. "scratch" or "dent"
    pub defect_type: String,
    /// Detector confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Human-readable location within the image
    pub location: String,
}

impl Defect {
    pub fn new(defect_type: impl Into<String>, confidence: f64, location: impl Into<String>) -> Self {
        Self {
            defect_type: defect_type.into(),
            confidence,
            location: location.into(),
        }
    }

    /// Whether the confidence honors the detector contract.
    pub fn confidence_in_range(&self) -> bool {
        self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }

    /// Force the confidence into [0.0, 1.0]. Returns true if the value
    /// had to change, so callers can record the contract violation.
    pub fn clamp_confidence(&mut self) -> bool {
        if self.confidence_in_range() {
            return false;
        }
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_confidence_untouched() {
        let mut defect = Defect::new("scratch", 0.92, "(0, 0) 16x16");
        assert!(defect.confidence_in_range());
        assert!(!defect.clamp_confidence());
        assert!((defect.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_out_of_range_confidence() {
        let mut high = Defect::new("scratch", 1.7, "(0, 0) 16x16");
        assert!(high.clamp_confidence());
        assert!((high.confidence - 1.0).abs() < f64::EPSILON);

        let mut low = Defect::new("dent", -0.2, "(0, 0) 16x16");
        assert!(low.clamp_confidence());
        assert!(low.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_nan_confidence() {
        let mut defect = Defect::new("scratch", f64::NAN, "(0, 0) 16x16");
        assert!(defect.clamp_confidence());
        assert!(defect.confidence.abs() < f64::EPSILON);
    }
}
