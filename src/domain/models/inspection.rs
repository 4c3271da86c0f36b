//! Inspection domain model.
//!
//! An inspection is the central aggregate: one submitted image moving
//! through detection and measurement to a pass/fail verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::defect::Defect;
use super::measurement::Measurement;

/// Status of an inspection in the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    /// Inspection is accepted but the pipeline has not started
    #[default]
    Ready,
    /// Detection and measurement are running
    Processing,
    /// Pipeline finished and a verdict was reached
    Completed,
    /// Pipeline could not produce a verdict
    Failed,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ready" => Some(Self::Ready),
            "processing" => Some(Self::Processing),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an active (non-terminal) state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<InspectionStatus> {
        match self {
            Self::Ready => vec![Self::Processing, Self::Failed],
            Self::Processing => vec![Self::Completed, Self::Failed],
            Self::Completed => vec![],
            Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Final classification of an inspected part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Part meets all configured acceptance criteria
    Passed,
    /// Part violates at least one acceptance criterion
    Failed,
    /// Pipeline completed but produced no data to judge the part by
    Undetermined,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Undetermined => "undetermined",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "passed" | "pass" => Some(Self::Passed),
            "failed" | "fail" => Some(Self::Failed),
            "undetermined" => Some(Self::Undetermined),
            _ => None,
        }
    }
}

/// The two concurrent pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Detection,
    Measurement,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detection => "detection",
            Self::Measurement => "measurement",
        }
    }
}

/// How a single stage run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage produced its output
    Succeeded,
    /// Stage ran but could not produce output (e.g. uncalibrated measurer)
    Unavailable,
    /// Stage returned an error
    Failed,
    /// Stage exceeded the configured timeout
    TimedOut,
    /// Stage was interrupted by cancellation
    Cancelled,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this outcome counts as a stage failure for the
    /// both-stages-failed pipeline check. Unavailable does not: the
    /// stage ran fine, there was just nothing to measure with.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

/// Audit record of one stage run within an inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage ran
    pub stage: StageKind,
    /// How it ended
    pub status: StageStatus,
    /// Error message, unavailability reason, or contract-violation note
    pub detail: Option<String>,
    /// Wall-clock duration of the stage run
    pub elapsed_ms: u64,
}

impl StageReport {
    pub fn new(stage: StageKind, status: StageStatus, elapsed_ms: u64) -> Self {
        Self { stage, status, detail: None, elapsed_ms }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Why an inspection ended in the failed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InspectionFailure {
    /// Both pipeline stages failed; no data to judge the part by
    Pipeline { detail: String },
    /// The inspection was cancelled before it could finish
    Cancelled,
}

impl InspectionFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline { .. } => "pipeline",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A single part moving through the inspection pipeline.
///
/// The orchestrator owns an inspection exclusively while it is active.
/// Once terminal, the record is immutable: `defects`, `measurement` and
/// `verdict` are set exactly once at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// Unique identifier
    pub id: Uuid,
    /// Physical station slot this inspection claimed
    pub slot: String,
    /// Caller-supplied label for the part, if any
    pub part_label: Option<String>,
    /// Current status
    pub status: InspectionStatus,
    /// Detection output. `None` until detection completes; an empty
    /// vector is a valid clean result, distinct from absence.
    pub defects: Option<Vec<Defect>>,
    /// Measurement output, at most one per inspection
    pub measurement: Option<Measurement>,
    /// Final classification. Present if and only if status is Completed.
    pub verdict: Option<Verdict>,
    /// Per-stage audit trail
    pub stage_reports: Vec<StageReport>,
    /// Failure reason. Present if and only if status is Failed.
    pub failure: Option<InspectionFailure>,
    /// When the submission was accepted
    pub submitted_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
    /// When the pipeline started
    pub started_at: Option<DateTime<Utc>>,
    /// When the inspection reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl Inspection {
    /// Create a new inspection claiming the given slot.
    pub fn new(slot: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slot: slot.into(),
            part_label: None,
            status: InspectionStatus::default(),
            defects: None,
            measurement: None,
            verdict: None,
            stage_reports: Vec::new(),
            failure: None,
            submitted_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Set the caller-supplied part label.
    pub fn with_part_label(mut self, label: impl Into<String>) -> Self {
        self.part_label = Some(label.into());
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: InspectionStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status.
    pub fn transition_to(&mut self, new_status: InspectionStatus) -> Result<(), String> {
        if !self.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }

        self.status = new_status;
        self.updated_at = Utc::now();

        match new_status {
            InspectionStatus::Processing => self.started_at = Some(Utc::now()),
            InspectionStatus::Completed | InspectionStatus::Failed => {
                self.completed_at = Some(Utc::now());
            }
            InspectionStatus::Ready => {}
        }

        Ok(())
    }

    /// Record one stage outcome on the audit trail.
    pub fn record_stage(&mut self, report: StageReport) {
        self.stage_reports.push(report);
        self.updated_at = Utc::now();
    }

    /// Finalize with a verdict. This is the only place a verdict is set,
    /// which keeps verdict presence tied to the completed status.
    pub fn complete(
        &mut self,
        verdict: Verdict,
        defects: Option<Vec<Defect>>,
        measurement: Option<Measurement>,
    ) -> Result<(), String> {
        self.transition_to(InspectionStatus::Completed)?;
        self.defects = defects;
        self.measurement = measurement;
        self.verdict = Some(verdict);
        Ok(())
    }

    /// Finalize as failed. No verdict is recorded: a failed inspection
    /// says nothing about the part.
    pub fn fail(&mut self, failure: InspectionFailure) -> Result<(), String> {
        self.transition_to(InspectionStatus::Failed)?;
        self.failure = Some(failure);
        Ok(())
    }

    /// Check if the inspection is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of detected defects, zero while detection is pending.
    pub fn defect_count(&self) -> usize {
        self.defects.as_ref().map_or(0, Vec::len)
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.slot.trim().is_empty() {
            return Err("Inspection slot cannot be empty".to_string());
        }
        if self.verdict.is_some() != (self.status == InspectionStatus::Completed) {
            return Err("Verdict must be present exactly when status is completed".to_string());
        }
        if self.failure.is_some() != (self.status == InspectionStatus::Failed) {
            return Err("Failure reason must be present exactly when status is failed".to_string());
        }
        if self.status.is_terminal() && self.completed_at.is_none() {
            return Err("Terminal inspection must carry a completion timestamp".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspection_creation() {
        let inspection = Inspection::new("station-1").with_part_label("Bearing Housing");
        assert_eq!(inspection.status, InspectionStatus::Ready);
        assert_eq!(inspection.slot, "station-1");
        assert_eq!(inspection.part_label.as_deref(), Some("Bearing Housing"));
        assert!(inspection.defects.is_none());
        assert!(inspection.verdict.is_none());
        assert!(inspection.validate().is_ok());
    }

    #[test]
    fn test_state_transitions() {
        let mut inspection = Inspection::new("station-1");

        // Ready -> Processing
        assert!(inspection.can_transition_to(InspectionStatus::Processing));
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        assert!(inspection.started_at.is_some());

        // Processing -> Completed
        inspection.transition_to(InspectionStatus::Completed).unwrap();
        assert!(inspection.completed_at.is_some());
        assert!(inspection.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut completed = Inspection::new("station-1");
        completed.transition_to(InspectionStatus::Processing).unwrap();
        completed.transition_to(InspectionStatus::Completed).unwrap();
        assert!(completed.transition_to(InspectionStatus::Processing).is_err());
        assert!(completed.transition_to(InspectionStatus::Failed).is_err());

        let mut failed = Inspection::new("station-1");
        failed.transition_to(InspectionStatus::Processing).unwrap();
        failed.transition_to(InspectionStatus::Failed).unwrap();
        assert!(failed.transition_to(InspectionStatus::Completed).is_err());
    }

    #[test]
    fn test_ready_cannot_complete_directly() {
        let mut inspection = Inspection::new("station-1");
        assert!(!inspection.can_transition_to(InspectionStatus::Completed));
        assert!(inspection.transition_to(InspectionStatus::Completed).is_err());
        assert_eq!(inspection.status, InspectionStatus::Ready);
    }

    #[test]
    fn test_complete_sets_verdict_and_data() {
        let mut inspection = Inspection::new("station-1");
        inspection.transition_to(InspectionStatus::Processing).unwrap();

        let defects = vec![Defect::new("scratch", 0.92, "(32, 16) 16x16")];
        inspection
            .complete(Verdict::Failed, Some(defects), None)
            .unwrap();

        assert_eq!(inspection.status, InspectionStatus::Completed);
        assert_eq!(inspection.verdict, Some(Verdict::Failed));
        assert_eq!(inspection.defect_count(), 1);
        assert!(inspection.completed_at.is_some());
        assert!(inspection.validate().is_ok());
    }

    #[test]
    fn test_fail_records_reason_without_verdict() {
        let mut inspection = Inspection::new("station-1");
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        inspection
            .fail(InspectionFailure::Pipeline { detail: "both stages failed".to_string() })
            .unwrap();

        assert_eq!(inspection.status, InspectionStatus::Failed);
        assert!(inspection.verdict.is_none());
        assert!(matches!(inspection.failure, Some(InspectionFailure::Pipeline { .. })));
        assert!(inspection.validate().is_ok());
    }

    #[test]
    fn test_empty_defect_list_is_distinct_from_absence() {
        let mut inspection = Inspection::new("station-1");
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        inspection.complete(Verdict::Passed, Some(vec![]), None).unwrap();

        assert!(inspection.defects.is_some());
        assert_eq!(inspection.defect_count(), 0);
    }

    #[test]
    fn test_validate_rejects_verdict_mismatch() {
        let mut inspection = Inspection::new("station-1");
        inspection.verdict = Some(Verdict::Passed);
        assert!(inspection.validate().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InspectionStatus::Ready,
            InspectionStatus::Processing,
            InspectionStatus::Completed,
            InspectionStatus::Failed,
        ] {
            assert_eq!(InspectionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(InspectionStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_stage_report_failure_classes() {
        assert!(StageStatus::Failed.is_failure());
        assert!(StageStatus::TimedOut.is_failure());
        assert!(!StageStatus::Succeeded.is_failure());
        assert!(!StageStatus::Unavailable.is_failure());
        assert!(!StageStatus::Cancelled.is_failure());
    }
}
