//! Built-in bounding-extent measurer.

use async_trait::async_trait;

use crate::domain::errors::MeasurementError;
use crate::domain::models::{Calibration, Measurement, MeasurementOutcome};
use crate::domain::ports::Measurer;

/// Measurer that estimates part dimensions from its silhouette.
///
/// Separates part from background with Otsu's threshold on the luminance
/// histogram, takes the bounding extent of the part pixels and converts
/// to millimeters via the calibration's pixel scale. The longer side is
/// reported as length. Without a calibration there is no pixel-to-mm
/// mapping, so the stage reports itself unavailable rather than guessing.
#[derive(Debug, Clone, Default)]
pub struct ExtentMeasurer;

impl ExtentMeasurer {
    pub fn new() -> Self {
        Self
    }

    /// Otsu's method: the threshold maximizing between-class variance.
    /// Returns None when the histogram has no spread to split.
    fn otsu_threshold(histogram: &[u64; 256], total: u64) -> Option<u8> {
        let sum_all: f64 = histogram
            .iter()
            .enumerate()
            .map(|(value, &count)| value as f64 * count as f64)
            .sum();

        let mut sum_dark = 0.0_f64;
        let mut weight_dark = 0_u64;
        let mut best_threshold = None;
        let mut best_variance = 0.0_f64;

        for value in 0..256_usize {
            weight_dark += histogram[value];
            if weight_dark == 0 {
                continue;
            }
            let weight_bright = total - weight_dark;
            if weight_bright == 0 {
                break;
            }

            sum_dark += value as f64 * histogram[value] as f64;
            let mean_dark = sum_dark / weight_dark as f64;
            let mean_bright = (sum_all - sum_dark) / weight_bright as f64;
            let between = weight_dark as f64
                * weight_bright as f64
                * (mean_dark - mean_bright).powi(2);

            if between > best_variance {
                best_variance = between;
                best_threshold = Some(value as u8);
            }
        }
        best_threshold
    }
}

#[async_trait]
impl Measurer for ExtentMeasurer {
    fn measurer_id(&self) -> &str {
        "extent"
    }

    async fn measure(
        &self,
        image: &[u8],
        calibration: Option<&Calibration>,
    ) -> Result<MeasurementOutcome, MeasurementError> {
        let Some(calibration) = calibration else {
            return Ok(MeasurementOutcome::Unavailable {
                reason: "no calibration configured".to_string(),
            });
        };

        let decoded = image::load_from_memory(image)
            .map_err(|err| MeasurementError::InvalidImage(err.to_string()))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        let total = u64::from(width) * u64::from(height);
        if total == 0 {
            return Err(MeasurementError::InvalidImage(
                "image has no pixels".to_string(),
            ));
        }

        let mut histogram = [0_u64; 256];
        for pixel in gray.pixels() {
            histogram[pixel.0[0] as usize] += 1;
        }

        let Some(threshold) = Self::otsu_threshold(&histogram, total) else {
            return Ok(MeasurementOutcome::Unavailable {
                reason: "no part distinguishable from background".to_string(),
            });
        };

        // The part is whichever side of the split covers less of the
        // frame; a staged part never fills more than the background does.
        let dark_count: u64 = histogram[..=threshold as usize].iter().sum();
        let bright_count = total - dark_count;
        let part_is_bright = bright_count <= dark_count;

        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0_u32;
        let mut max_y = 0_u32;
        let mut part_pixels = 0_u64;
        for (x, y, pixel) in gray.enumerate_pixels() {
            let bright = pixel.0[0] > threshold;
            if bright != part_is_bright {
                continue;
            }
            part_pixels += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if part_pixels == 0 {
            return Ok(MeasurementOutcome::Unavailable {
                reason: "no part distinguishable from background".to_string(),
            });
        }

        let extent_x = f64::from(max_x - min_x + 1) * calibration.mm_per_pixel;
        let extent_y = f64::from(max_y - min_y + 1) * calibration.mm_per_pixel;

        let mut measurement = Measurement::new(extent_x.max(extent_y), extent_x.min(extent_y));
        if let Some(nominal) = calibration.nominal {
            measurement = measurement.with_nominal(nominal);
        }
        Ok(MeasurementOutcome::Measured(measurement))
    }
}
