//! Domain errors for the inspection pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors surfaced by the orchestrator and repositories.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid image submission: {0}")]
    InvalidInput(String),

    #[error("Slot '{slot}' is busy with inspection {inspection_id}")]
    SlotBusy { slot: String, inspection_id: Uuid },

    #[error("Inspection not found: {0}")]
    InspectionNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition { from: String, to: String, reason: String },

    #[error("Pipeline failed: {0}")]
    PipelineFailed(String),

    #[error("Inspection {0} was cancelled")]
    Cancelled(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Errors a detector stage can report.
///
/// Stage errors never abort the whole inspection on their own. The
/// orchestrator records them on the inspection's stage reports and
/// proceeds with whatever the other stage produced.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("Image decode failed: {0}")]
    InvalidImage(String),

    #[error("Detection failed: {0}")]
    Failed(String),

    #[error("Detector unavailable: {0}")]
    Unavailable(String),
}

/// Errors a measurer stage can report.
#[derive(Debug, Clone, Error)]
pub enum MeasurementError {
    #[error("Image decode failed: {0}")]
    InvalidImage(String),

    #[error("Measurement failed: {0}")]
    Failed(String),
}
