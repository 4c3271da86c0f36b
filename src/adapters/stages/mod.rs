//! Detection and measurement stage adapters.

pub mod extent;
pub mod luminance;
pub mod mock;

pub use extent::ExtentMeasurer;
pub use luminance::LuminanceDetector;
pub use mock::{MockDetection, MockDetector, MockMeasurement, MockMeasurer};
