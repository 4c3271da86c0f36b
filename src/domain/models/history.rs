//! History entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::defect::Defect;
use super::inspection::{
    Inspection, InspectionFailure, InspectionStatus, StageReport, Verdict,
};
use super::measurement::Measurement;

/// Immutable snapshot of a finalized inspection.
///
/// Built exactly once, when an inspection reaches a terminal state, and
/// never mutated afterwards. `defect_count` is denormalized so history
/// listings do not have to unpack the defect sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub slot: String,
    pub part_label: Option<String>,
    /// Terminal status, Completed or Failed
    pub status: InspectionStatus,
    pub verdict: Option<Verdict>,
    pub defects: Option<Vec<Defect>>,
    pub defect_count: u32,
    pub measurement: Option<Measurement>,
    pub stage_reports: Vec<StageReport>,
    pub failure: Option<InspectionFailure>,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Snapshot a terminal inspection. Non-terminal inspections never
    /// enter the history.
    pub fn from_inspection(inspection: &Inspection) -> Result<Self, String> {
        if !inspection.is_terminal() {
            return Err(format!(
                "Cannot record a {} inspection in history",
                inspection.status.as_str()
            ));
        }
        let completed_at = inspection
            .completed_at
            .ok_or_else(|| "Terminal inspection is missing its completion timestamp".to_string())?;
        inspection.validate()?;

        Ok(Self {
            id: inspection.id,
            slot: inspection.slot.clone(),
            part_label: inspection.part_label.clone(),
            status: inspection.status,
            verdict: inspection.verdict,
            defects: inspection.defects.clone(),
            defect_count: inspection.defect_count() as u32,
            measurement: inspection.measurement.clone(),
            stage_reports: inspection.stage_reports.clone(),
            failure: inspection.failure.clone(),
            submitted_at: inspection.submitted_at,
            completed_at,
        })
    }

    /// Whether this entry records a failure of the machinery rather
    /// than a judgement of the part.
    pub fn is_pipeline_failure(&self) -> bool {
        self.status == InspectionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_completed_inspection() {
        let mut inspection = Inspection::new("station-1").with_part_label("Valve Body");
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        inspection
            .complete(
                Verdict::Failed,
                Some(vec![Defect::new("scratch", 0.92, "(32, 16) 16x16")]),
                None,
            )
            .unwrap();

        let entry = HistoryEntry::from_inspection(&inspection).unwrap();
        assert_eq!(entry.id, inspection.id);
        assert_eq!(entry.verdict, Some(Verdict::Failed));
        assert_eq!(entry.defect_count, 1);
        assert!(!entry.is_pipeline_failure());
    }

    #[test]
    fn test_snapshot_of_failed_inspection() {
        let mut inspection = Inspection::new("station-1");
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        inspection
            .fail(InspectionFailure::Pipeline { detail: "both stages failed".to_string() })
            .unwrap();

        let entry = HistoryEntry::from_inspection(&inspection).unwrap();
        assert!(entry.verdict.is_none());
        assert!(entry.is_pipeline_failure());
    }

    #[test]
    fn test_non_terminal_inspection_rejected() {
        let inspection = Inspection::new("station-1");
        assert!(HistoryEntry::from_inspection(&inspection).is_err());

        let mut processing = Inspection::new("station-1");
        processing.transition_to(InspectionStatus::Processing).unwrap();
        assert!(HistoryEntry::from_inspection(&processing).is_err());
    }
}
