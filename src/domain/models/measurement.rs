//! Dimensional measurement record.

use serde::{Deserialize, Serialize};

/// Expected dimensions of the part being inspected, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalDimensions {
    pub length_mm: f64,
    pub width_mm: f64,
}

impl NominalDimensions {
    pub fn new(length_mm: f64, width_mm: f64) -> Self {
        Self { length_mm, width_mm }
    }
}

/// Measured dimensions of an inspected part.
///
/// `deviation_mm` is the worst-axis absolute difference against the
/// nominal dimensions. It stays unset, never zero, when no nominal is
/// configured: an unknown deviation cannot violate a tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Longer measured axis, in millimeters
    pub length_mm: f64,
    /// Shorter measured axis, in millimeters
    pub width_mm: f64,
    /// Worst-axis deviation from nominal, if a nominal is configured
    pub deviation_mm: Option<f64>,
    /// Nominal dimensions the deviation was computed against
    pub nominal: Option<NominalDimensions>,
}

impl Measurement {
    pub fn new(length_mm: f64, width_mm: f64) -> Self {
        Self {
            length_mm,
            width_mm,
            deviation_mm: None,
            nominal: None,
        }
    }

    /// Attach nominal dimensions and derive the deviation from them.
    pub fn with_nominal(mut self, nominal: NominalDimensions) -> Self {
        let length_dev = (self.length_mm - nominal.length_mm).abs();
        let width_dev = (self.width_mm - nominal.width_mm).abs();
        self.deviation_mm = Some(length_dev.max(width_dev));
        self.nominal = Some(nominal);
        self
    }

    /// Whether the measurement stays within the given tolerance. A
    /// measurement without a deviation always does.
    pub fn within_tolerance(&self, tolerance_mm: f64) -> bool {
        self.deviation_mm.is_none_or(|dev| dev <= tolerance_mm)
    }
}

/// What a measurer run produced.
///
/// `Unavailable` is a legitimate outcome, not an error: the stage ran
/// but had nothing to measure with (e.g. no calibration configured).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MeasurementOutcome {
    Measured(Measurement),
    Unavailable { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_is_worst_axis() {
        let measurement = Measurement::new(25.5, 12.7)
            .with_nominal(NominalDimensions::new(25.4, 12.7));
        let deviation = measurement.deviation_mm.unwrap();
        assert!((deviation - 0.1).abs() < 1e-9);

        let measurement = Measurement::new(25.5, 12.4)
            .with_nominal(NominalDimensions::new(25.4, 12.7));
        let deviation = measurement.deviation_mm.unwrap();
        assert!((deviation - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance_without_nominal_always_passes() {
        let measurement = Measurement::new(25.4, 12.7);
        assert!(measurement.deviation_mm.is_none());
        assert!(measurement.within_tolerance(0.0));
        assert!(measurement.within_tolerance(0.2));
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        // 0.25 is exactly representable, so the boundary comparison is exact
        let measurement = Measurement::new(25.75, 12.5)
            .with_nominal(NominalDimensions::new(25.5, 12.5));
        assert_eq!(measurement.deviation_mm, Some(0.25));
        assert!(measurement.within_tolerance(0.25));
        assert!(!measurement.within_tolerance(0.2));
    }
}
