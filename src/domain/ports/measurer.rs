use async_trait::async_trait;

use crate::domain::errors::MeasurementError;
use crate::domain::models::{Calibration, MeasurementOutcome};

/// Port trait for dimensional measurement backends
///
/// Implementations estimate the physical extent of the part in the image.
/// A backend that cannot measure (no calibration, nothing in frame)
/// returns `MeasurementOutcome::Unavailable` rather than an error, and the
/// inspection proceeds without dimensional data.
#[async_trait]
pub trait Measurer: Send + Sync {
    /// Get the unique identifier for this measurer backend
    ///
    /// Examples: "extent", "mock"
    fn measurer_id(&self) -> &str;

    /// Measure the part in an image payload
    ///
    /// # Arguments
    /// * `image` - Raw encoded image bytes, already validated as decodable
    /// * `calibration` - Pixel-to-millimeter mapping, when configured
    ///
    /// # Returns
    /// * `Ok(MeasurementOutcome::Measured)` - Dimensions were obtained
    /// * `Ok(MeasurementOutcome::Unavailable)` - No measurement possible,
    ///   inspection continues without one
    /// * `Err(MeasurementError)` - The stage failed outright
    ///
    /// # Errors
    /// - `MeasurementError::InvalidImage` - Payload could not be decoded
    /// - `MeasurementError::Failed` - Measurement failed partway through
    async fn measure(
        &self,
        image: &[u8],
        calibration: Option<&Calibration>,
    ) -> Result<MeasurementOutcome, MeasurementError>;
}
