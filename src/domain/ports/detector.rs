use async_trait::async_trait;

use crate::domain::errors::DetectionError;
use crate::domain::models::Defect;

/// Port trait for surface defect detection backends
///
/// Implementations analyze a raw image payload and report the surface
/// defects they find, ordered by their own ranking. An empty result is a
/// successful clean scan, not an error.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so inspections on different
/// slots can run them concurrently.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Get the unique identifier for this detector backend
    ///
    /// Examples: "luminance", "mock"
    fn detector_id(&self) -> &str;

    /// Analyze an image payload for surface defects
    ///
    /// # Arguments
    /// * `image` - Raw encoded image bytes, already validated as decodable
    ///
    /// # Returns
    /// * `Ok(Vec<Defect>)` - Defects found, possibly empty
    /// * `Err(DetectionError)` - The stage failed and produced no result
    ///
    /// # Errors
    /// - `DetectionError::InvalidImage` - Payload could not be decoded
    /// - `DetectionError::Failed` - Analysis failed partway through
    /// - `DetectionError::Unavailable` - Backend cannot run at all
    async fn detect(&self, image: &[u8]) -> Result<Vec<Defect>, DetectionError>;
}
