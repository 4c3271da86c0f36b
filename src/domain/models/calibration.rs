//! Camera calibration model.

use serde::{Deserialize, Serialize};

use super::measurement::NominalDimensions;

/// Pixel-to-millimeter mapping established during station setup.
///
/// Derived from imaging a reference object of known size; without it the
/// measurer has no real-world scale and reports itself unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Real-world millimeters represented by one image pixel
    pub mm_per_pixel: f64,
    /// Nominal dimensions of the part currently being produced, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<NominalDimensions>,
}

impl Calibration {
    pub fn new(mm_per_pixel: f64) -> Self {
        Self { mm_per_pixel, nominal: None }
    }

    /// Set the nominal dimensions deviations are computed against.
    pub fn with_nominal(mut self, nominal: NominalDimensions) -> Self {
        self.nominal = Some(nominal);
        self
    }

    /// Validate the calibration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.mm_per_pixel.is_finite() || self.mm_per_pixel <= 0.0 {
            return Err(format!(
                "mm_per_pixel must be a positive finite number, got {}",
                self.mm_per_pixel
            ));
        }
        if let Some(nominal) = &self.nominal {
            if nominal.length_mm <= 0.0 || nominal.width_mm <= 0.0 {
                return Err("Nominal dimensions must be positive".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_calibration() {
        let calibration = Calibration::new(0.05)
            .with_nominal(NominalDimensions::new(25.4, 12.7));
        assert!(calibration.validate().is_ok());
    }

    #[test]
    fn test_invalid_scale_rejected() {
        assert!(Calibration::new(0.0).validate().is_err());
        assert!(Calibration::new(-0.1).validate().is_err());
        assert!(Calibration::new(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_invalid_nominal_rejected() {
        let calibration = Calibration::new(0.05)
            .with_nominal(NominalDimensions::new(0.0, 12.7));
        assert!(calibration.validate().is_err());
    }
}
