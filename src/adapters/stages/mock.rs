//! Mock detection and measurement stages for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DetectionError, MeasurementError};
use crate::domain::models::{Calibration, Defect, Measurement, MeasurementOutcome};
use crate::domain::ports::{Detector, Measurer};

/// Scripted detector response.
#[derive(Debug, Clone, Default)]
pub struct MockDetection {
    /// Defects to report
    pub defects: Vec<Defect>,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    /// Artificial stage latency
    pub delay: Option<Duration>,
}

impl MockDetection {
    pub fn success(defects: Vec<Defect>) -> Self {
        Self {
            defects,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock detector for testing.
///
/// Responses can be scripted per payload; payloads without an override
/// get the default response. Call counts are tracked for assertions.
pub struct MockDetector {
    default_response: MockDetection,
    response_overrides: Arc<RwLock<HashMap<Vec<u8>, MockDetection>>>,
    calls: AtomicUsize,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::with_default_response(MockDetection::default())
    }

    pub fn with_default_response(response: MockDetection) -> Self {
        Self {
            default_response: response,
            response_overrides: Arc::new(RwLock::new(HashMap::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set a specific response for a payload.
    pub async fn set_response_for_payload(&self, payload: impl Into<Vec<u8>>, response: MockDetection) {
        let mut overrides = self.response_overrides.write().await;
        overrides.insert(payload.into(), response);
    }

    /// How many times detect was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn get_response(&self, payload: &[u8]) -> MockDetection {
        let overrides = self.response_overrides.read().await;
        overrides
            .get(payload)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn detector_id(&self) -> &str {
        "mock"
    }

    async fn detect(&self, image: &[u8]) -> Result<Vec<Defect>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.get_response(image).await;

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        if response.fail {
            return Err(DetectionError::Failed(
                response
                    .error_message
                    .unwrap_or_else(|| "Mock detection failure".to_string()),
            ));
        }
        Ok(response.defects)
    }
}

/// Scripted measurer response.
#[derive(Debug, Clone)]
pub struct MockMeasurement {
    /// Outcome to report
    pub outcome: MeasurementOutcome,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    /// Artificial stage latency
    pub delay: Option<Duration>,
}

impl Default for MockMeasurement {
    fn default() -> Self {
        Self {
            outcome: MeasurementOutcome::Measured(Measurement::new(25.5, 12.5)),
            fail: false,
            error_message: None,
            delay: None,
        }
    }
}

impl MockMeasurement {
    pub fn success(measurement: Measurement) -> Self {
        Self {
            outcome: MeasurementOutcome::Measured(measurement),
            ..Default::default()
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            outcome: MeasurementOutcome::Unavailable {
                reason: reason.into(),
            },
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock measurer for testing.
pub struct MockMeasurer {
    default_response: MockMeasurement,
    response_overrides: Arc<RwLock<HashMap<Vec<u8>, MockMeasurement>>>,
    calls: AtomicUsize,
}

impl MockMeasurer {
    pub fn new() -> Self {
        Self::with_default_response(MockMeasurement::default())
    }

    pub fn with_default_response(response: MockMeasurement) -> Self {
        Self {
            default_response: response,
            response_overrides: Arc::new(RwLock::new(HashMap::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set a specific response for a payload.
    pub async fn set_response_for_payload(&self, payload: impl Into<Vec<u8>>, response: MockMeasurement) {
        let mut overrides = self.response_overrides.write().await;
        overrides.insert(payload.into(), response);
    }

    /// How many times measure was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn get_response(&self, payload: &[u8]) -> MockMeasurement {
        let overrides = self.response_overrides.read().await;
        overrides
            .get(payload)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Measurer for MockMeasurer {
    fn measurer_id(&self) -> &str {
        "mock"
    }

    async fn measure(
        &self,
        image: &[u8],
        _calibration: Option<&Calibration>,
    ) -> Result<MeasurementOutcome, MeasurementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.get_response(image).await;

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        if response.fail {
            return Err(MeasurementError::Failed(
                response
                    .error_message
                    .unwrap_or_else(|| "Mock measurement failure".to_string()),
            ));
        }
        Ok(response.outcome)
    }
}
