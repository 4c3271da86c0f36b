//! Image submission model.

/// Slot claimed when the caller does not name one.
pub const DEFAULT_SLOT: &str = "station-1";

/// A captured image handed to the pipeline for inspection.
///
/// Immutable once accepted: the orchestrator never mutates the payload
/// or metadata after `submit` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSubmission {
    /// Encoded image bytes (PNG, JPEG, BMP, ...)
    pub payload: Vec<u8>,
    /// Caller-supplied label for the part, if any
    pub part_label: Option<String>,
    /// Station slot to claim for this inspection
    pub slot: String,
}

impl ImageSubmission {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            part_label: None,
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    /// Set the part label.
    pub fn with_part_label(mut self, label: impl Into<String>) -> Self {
        self.part_label = Some(label.into());
        self
    }

    /// Claim a specific slot instead of the default station.
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Validate the submission before any inspection state is created.
    ///
    /// Rejects empty payloads, payloads that do not decode as an image,
    /// and blank slot names.
    pub fn validate(&self) -> Result<(), String> {
        if self.slot.trim().is_empty() {
            return Err("Slot name cannot be empty".to_string());
        }
        if self.payload.is_empty() {
            return Err("Image payload is empty".to_string());
        }
        image::load_from_memory(&self.payload)
            .map(|_| ())
            .map_err(|e| format!("Image payload does not decode: {e}"))
    }
}
