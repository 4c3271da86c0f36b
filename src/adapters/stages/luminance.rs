//! Built-in luminance-anomaly defect detector.

use async_trait::async_trait;

use crate::domain::errors::DetectionError;
use crate::domain::models::Defect;
use crate::domain::ports::Detector;

/// Detector that flags luminance anomalies on a machined surface.
///
/// The image is pooled into a grid of chunks; per-chunk mean luminance
/// cancels single-pixel sensor noise. Chunks whose mean sits far from the
/// frame's own statistics are reported as defects: dark outliers read as
/// dents or pits, bright outliers as scratches or burrs catching the
/// light. Scoring against the frame's own mean and spread makes the
/// detector insensitive to overall exposure.
#[derive(Debug, Clone)]
pub struct LuminanceDetector {
    chunk_size: u32,
    z_threshold: f64,
}

impl Default for LuminanceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LuminanceDetector {
    /// Create a detector with default pooling and sensitivity.
    pub fn new() -> Self {
        Self {
            chunk_size: 16,
            z_threshold: 2.5,
        }
    }

    /// Create a detector with custom chunk size and z-score threshold.
    pub fn with_params(chunk_size: u32, z_threshold: f64) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            z_threshold,
        }
    }

    /// Mean luminance per grid chunk, row-major.
    fn chunk_means(&self, gray: &image::GrayImage) -> (Vec<f64>, u32, u32) {
        let (width, height) = gray.dimensions();
        let grid_width = width.div_ceil(self.chunk_size);
        let grid_height = height.div_ceil(self.chunk_size);

        let mut means = Vec::with_capacity((grid_width * grid_height) as usize);
        for gy in 0..grid_height {
            for gx in 0..grid_width {
                let x0 = gx * self.chunk_size;
                let y0 = gy * self.chunk_size;
                let x1 = (x0 + self.chunk_size).min(width);
                let y1 = (y0 + self.chunk_size).min(height);

                let mut sum = 0_u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += u64::from(gray.get_pixel(x, y).0[0]);
                    }
                }
                let count = u64::from((x1 - x0) * (y1 - y0));
                means.push(sum as f64 / count as f64);
            }
        }
        (means, grid_width, grid_height)
    }
}

#[async_trait]
impl Detector for LuminanceDetector {
    fn detector_id(&self) -> &str {
        "luminance"
    }

    async fn detect(&self, image: &[u8]) -> Result<Vec<Defect>, DetectionError> {
        let decoded = image::load_from_memory(image)
            .map_err(|err| DetectionError::InvalidImage(err.to_string()))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidImage(
                "image has no pixels".to_string(),
            ));
        }

        let (means, grid_width, _) = self.chunk_means(&gray);

        let n = means.len() as f64;
        let mean = means.iter().sum::<f64>() / n;
        let variance = means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();
        if stddev <= f64::EPSILON {
            // Perfectly uniform surface, nothing stands out
            return Ok(Vec::new());
        }

        let mut defects = Vec::new();
        for (i, &chunk_mean) in means.iter().enumerate() {
            let z = (chunk_mean - mean) / stddev;
            if z.abs() < self.z_threshold {
                continue;
            }

            let gx = i as u32 % grid_width;
            let gy = i as u32 / grid_width;
            let x0 = gx * self.chunk_size;
            let y0 = gy * self.chunk_size;
            let w = (x0 + self.chunk_size).min(width) - x0;
            let h = (y0 + self.chunk_size).min(height) - y0;

            let defect_type = if z < 0.0 { "dent" } else { "scratch" };
            // Half confidence at the threshold, full at twice the threshold
            let confidence = (z.abs() / (2.0 * self.z_threshold)).min(1.0);
            defects.push(Defect::new(
                defect_type,
                confidence,
                format!("({x0}, {y0}) {w}x{h}"),
            ));
        }

        // Most confident findings first
        defects.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(defects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn encode_png(gray: &GrayImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        gray.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn paint_block(gray: &mut GrayImage, x0: u32, y0: u32, size: u32, value: u8) {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                gray.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[tokio::test]
    async fn test_uniform_surface_is_clean() {
        let gray = GrayImage::from_pixel(64, 64, Luma([180]));
        let detector = LuminanceDetector::new();

        let defects = detector.detect(&encode_png(&gray)).await.unwrap();
        assert!(defects.is_empty());
    }

    #[tokio::test]
    async fn test_dark_spot_reported_as_dent() {
        let mut gray = GrayImage::from_pixel(64, 64, Luma([200]));
        paint_block(&mut gray, 16, 16, 16, 20);
        let detector = LuminanceDetector::new();

        let defects = detector.detect(&encode_png(&gray)).await.unwrap();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].defect_type, "dent");
        assert_eq!(defects[0].location, "(16, 16) 16x16");
        assert!(defects[0].confidence > 0.5);
    }

    #[tokio::test]
    async fn test_bright_streak_reported_as_scratch() {
        let mut gray = GrayImage::from_pixel(64, 64, Luma([50]));
        paint_block(&mut gray, 32, 0, 16, 240);
        let detector = LuminanceDetector::new();

        let defects = detector.detect(&encode_png(&gray)).await.unwrap();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].defect_type, "scratch");
    }

    #[tokio::test]
    async fn test_findings_ordered_by_confidence() {
        let mut gray = GrayImage::from_pixel(96, 96, Luma([128]));
        paint_block(&mut gray, 0, 0, 16, 0);
        paint_block(&mut gray, 48, 48, 16, 255);
        let detector = LuminanceDetector::new();

        let defects = detector.detect(&encode_png(&gray)).await.unwrap();
        assert_eq!(defects.len(), 2);
        assert!(defects[0].confidence >= defects[1].confidence);
        assert_eq!(defects[0].defect_type, "dent");
        assert_eq!(defects[1].defect_type, "scratch");
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_invalid_image() {
        let detector = LuminanceDetector::new();
        let result = detector.detect(b"definitely not an image").await;

        assert!(matches!(result, Err(DetectionError::InvalidImage(_))));
    }
}
