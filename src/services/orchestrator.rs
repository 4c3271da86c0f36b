//! Inspection orchestration service.
//!
//! Owns the lifecycle of every inspection: accepts submissions, claims
//! station slots, fans out to the detection and measurement stages,
//! merges their results through the policy evaluator and hands the
//! finalized snapshot to the history store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Calibration, Defect, EngineConfig, HistoryEntry, ImageSubmission, Inspection,
    InspectionFailure, InspectionStatus, Measurement, MeasurementOutcome, PolicyThresholds,
    StageKind, StageReport, StageStatus, Verdict,
};
use crate::domain::ports::{Detector, HistoryFilter, HistoryRepository, HistorySummary, Measurer};
use crate::services::policy::PolicyEvaluator;

/// Events emitted as inspections move through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InspectionEvent {
    /// Submission validated and accepted, pipeline spawned
    Accepted { inspection_id: Uuid, slot: String },

    /// One stage finished, successfully or not
    StageFinished {
        inspection_id: Uuid,
        stage: StageKind,
        status: StageStatus,
    },

    /// Inspection reached a terminal state and entered the history
    Finalized {
        inspection_id: Uuid,
        status: InspectionStatus,
        verdict: Option<Verdict>,
    },
}

/// Runtime tuning for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on each stage run
    pub stage_timeout: Duration,
    /// Capacity of the broadcast event channel
    pub event_capacity: usize,
    /// Keep at most this many history entries, oldest pruned first
    pub history_retention: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_millis(30_000),
            event_capacity: 256,
            history_retention: None,
        }
    }
}

impl OrchestratorConfig {
    /// Derive orchestrator tuning from the engine configuration.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            stage_timeout: Duration::from_millis(config.stage.timeout_ms),
            history_retention: config.history.retention_limit,
            ..Self::default()
        }
    }
}

/// In-flight claim on a station slot.
struct SlotClaim {
    inspection_id: Uuid,
    cancel: CancellationToken,
}

/// Service coordinating the inspection pipeline.
///
/// Cheap to clone: every field is shared. Inspections on distinct slots
/// run fully in parallel; the per-slot claim map is the only mutual
/// exclusion between them.
#[derive(Clone)]
pub struct InspectionOrchestrator {
    detector: Arc<dyn Detector>,
    measurer: Arc<dyn Measurer>,
    history: Arc<dyn HistoryRepository>,
    thresholds: Arc<RwLock<PolicyThresholds>>,
    calibration: Arc<RwLock<Option<Calibration>>>,
    inspections: Arc<RwLock<HashMap<Uuid, Inspection>>>,
    slots: Arc<Mutex<HashMap<String, SlotClaim>>>,
    events: broadcast::Sender<InspectionEvent>,
    config: OrchestratorConfig,
}

impl InspectionOrchestrator {
    /// Create a new orchestrator over the given stage and storage adapters.
    pub fn new(
        detector: Arc<dyn Detector>,
        measurer: Arc<dyn Measurer>,
        history: Arc<dyn HistoryRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            detector,
            measurer,
            history,
            thresholds: Arc::new(RwLock::new(PolicyThresholds::default())),
            calibration: Arc::new(RwLock::new(None)),
            inspections: Arc::new(RwLock::new(HashMap::new())),
            slots: Arc::new(Mutex::new(HashMap::new())),
            events,
            config,
        }
    }

    /// Seed the policy thresholds. Only meaningful before sharing.
    pub fn with_thresholds(mut self, thresholds: PolicyThresholds) -> Self {
        self.thresholds = Arc::new(RwLock::new(thresholds));
        self
    }

    /// Seed the dimensional calibration. Only meaningful before sharing.
    pub fn with_calibration(mut self, calibration: Option<Calibration>) -> Self {
        self.calibration = Arc::new(RwLock::new(calibration));
        self
    }

    /// Submit an image for inspection.
    ///
    /// Returns the inspection id as soon as the submission is accepted;
    /// the pipeline itself runs as a spawned task. Callers follow
    /// progress via `status` or `subscribe`.
    ///
    /// # Errors
    /// - `DomainError::InvalidInput` - empty or undecodable payload,
    ///   nothing is created
    /// - `DomainError::SlotBusy` - the slot already has an inspection in
    ///   flight; that inspection is untouched
    #[instrument(skip(self, submission), fields(slot = %submission.slot), err)]
    pub async fn submit(&self, submission: ImageSubmission) -> DomainResult<Uuid> {
        // 1. Validate the payload before creating any state
        submission.validate().map_err(DomainError::InvalidInput)?;

        // 2. Claim the slot and create the inspection atomically. One
        //    inspection per slot at a time; a busy slot rejects the
        //    submission without touching the in-flight inspection.
        let cancel = CancellationToken::new();
        let inspection = {
            let mut slots = self.slots.lock().await;
            if let Some(claim) = slots.get(&submission.slot) {
                return Err(DomainError::SlotBusy {
                    slot: submission.slot.clone(),
                    inspection_id: claim.inspection_id,
                });
            }

            let mut inspection = Inspection::new(&submission.slot);
            if let Some(label) = &submission.part_label {
                inspection = inspection.with_part_label(label);
            }
            inspection
                .transition_to(InspectionStatus::Processing)
                .map_err(|reason| DomainError::InvalidStateTransition {
                    from: InspectionStatus::Ready.as_str().to_string(),
                    to: InspectionStatus::Processing.as_str().to_string(),
                    reason,
                })?;

            slots.insert(
                submission.slot.clone(),
                SlotClaim {
                    inspection_id: inspection.id,
                    cancel: cancel.clone(),
                },
            );
            inspection
        };

        // 3. Publish the accepted snapshot
        let id = inspection.id;
        {
            let mut inspections = self.inspections.write().await;
            inspections.insert(id, inspection);
        }
        let _ = self.events.send(InspectionEvent::Accepted {
            inspection_id: id,
            slot: submission.slot.clone(),
        });
        info!("Inspection {} accepted on slot {}", id, submission.slot);

        // 4. Run the pipeline in the background; submission returns promptly
        let this = self.clone();
        tokio::spawn(async move {
            this.run_pipeline(id, submission, cancel).await;
        });

        Ok(id)
    }

    /// Snapshot of an inspection, in-flight or terminal.
    pub async fn status(&self, id: Uuid) -> DomainResult<Inspection> {
        let inspections = self.inspections.read().await;
        inspections
            .get(&id)
            .cloned()
            .ok_or(DomainError::InspectionNotFound(id))
    }

    /// Request cancellation of an in-flight inspection.
    ///
    /// Cooperative: the pipeline observes the signal and still drives the
    /// inspection to a terminal state (`Failed` with a cancelled reason).
    /// Cancelling an already-terminal inspection is a no-op.
    #[instrument(skip(self), err)]
    pub async fn cancel(&self, id: Uuid) -> DomainResult<()> {
        {
            let inspections = self.inspections.read().await;
            let inspection = inspections
                .get(&id)
                .ok_or(DomainError::InspectionNotFound(id))?;
            if inspection.is_terminal() {
                debug!(
                    "Inspection {} is already {}, cancel is a no-op",
                    id,
                    inspection.status.as_str()
                );
                return Ok(());
            }
        }

        let slots = self.slots.lock().await;
        if let Some(claim) = slots.values().find(|claim| claim.inspection_id == id) {
            claim.cancel.cancel();
            info!("Cancellation signalled for inspection {}", id);
        }
        Ok(())
    }

    /// List finalized inspections, newest completion first.
    pub async fn list_history(&self, filter: &HistoryFilter) -> DomainResult<Vec<HistoryEntry>> {
        self.history.list(filter).await
    }

    /// Aggregate counts over the retained history.
    pub async fn summary(&self) -> DomainResult<HistorySummary> {
        self.history.summary().await
    }

    /// Replace the policy thresholds.
    ///
    /// Affects only inspections finalized after the change; a verdict is
    /// frozen with the thresholds in force at its finalize time.
    pub async fn set_thresholds(&self, thresholds: PolicyThresholds) -> DomainResult<()> {
        thresholds
            .validate()
            .map_err(DomainError::ValidationFailed)?;
        *self.thresholds.write().await = thresholds;
        info!("Policy thresholds updated");
        Ok(())
    }

    /// The thresholds currently in force.
    pub async fn thresholds(&self) -> PolicyThresholds {
        self.thresholds.read().await.clone()
    }

    /// Replace the dimensional calibration. `None` clears it, after which
    /// the measurement stage reports itself unavailable.
    pub async fn set_calibration(&self, calibration: Option<Calibration>) -> DomainResult<()> {
        if let Some(c) = &calibration {
            c.validate().map_err(DomainError::ValidationFailed)?;
        }
        *self.calibration.write().await = calibration;
        info!("Calibration updated");
        Ok(())
    }

    /// The calibration currently in force.
    pub async fn calibration(&self) -> Option<Calibration> {
        self.calibration.read().await.clone()
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<InspectionEvent> {
        self.events.subscribe()
    }

    /// Drive one inspection from fan-out to finalization.
    async fn run_pipeline(self, id: Uuid, submission: ImageSubmission, cancel: CancellationToken) {
        let calibration = self.calibration.read().await.clone();

        // Fan out. End-to-end stage latency is the slower of the two,
        // not the sum.
        let ((defects, detection_report), (measurement, measurement_report)) = tokio::join!(
            self.run_detection(id, &submission.payload, &cancel),
            self.run_measurement(id, &submission.payload, calibration.as_ref(), &cancel),
        );

        self.finalize(
            id,
            &submission.slot,
            defects,
            detection_report,
            measurement,
            measurement_report,
            &cancel,
        )
        .await;
    }

    /// Run the detection stage under timeout and cancellation.
    async fn run_detection(
        &self,
        id: Uuid,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> (Option<Vec<Defect>>, StageReport) {
        let started = Instant::now();
        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            result = timeout(self.config.stage_timeout, self.detector.detect(payload)) => Some(result),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (defects, report) = match outcome {
            None => (
                None,
                StageReport::new(StageKind::Detection, StageStatus::Cancelled, elapsed_ms),
            ),
            Some(Err(_)) => {
                warn!("Detection for inspection {} timed out after {}ms", id, elapsed_ms);
                (
                    None,
                    StageReport::new(StageKind::Detection, StageStatus::TimedOut, elapsed_ms)
                        .with_detail(format!(
                            "no result within {}ms",
                            self.config.stage_timeout.as_millis()
                        )),
                )
            }
            Some(Ok(Err(err))) => {
                warn!("Detection for inspection {} failed: {}", id, err);
                (
                    None,
                    StageReport::new(StageKind::Detection, StageStatus::Failed, elapsed_ms)
                        .with_detail(err.to_string()),
                )
            }
            Some(Ok(Ok(mut defects))) => {
                // Out-of-range confidences violate the detector contract.
                // Clamp into [0, 1] and note the violation on the report.
                let mut clamped = 0_usize;
                for defect in &mut defects {
                    if defect.clamp_confidence() {
                        clamped += 1;
                    }
                }
                let report = if clamped > 0 {
                    warn!(
                        "Detector returned {} out-of-range confidence value(s) for inspection {}",
                        clamped, id
                    );
                    StageReport::new(StageKind::Detection, StageStatus::Succeeded, elapsed_ms)
                        .with_detail(format!("clamped {clamped} confidence value(s) into [0, 1]"))
                } else {
                    StageReport::new(StageKind::Detection, StageStatus::Succeeded, elapsed_ms)
                };
                (Some(defects), report)
            }
        };

        let _ = self.events.send(InspectionEvent::StageFinished {
            inspection_id: id,
            stage: StageKind::Detection,
            status: report.status,
        });
        (defects, report)
    }

    /// Run the measurement stage under timeout and cancellation.
    async fn run_measurement(
        &self,
        id: Uuid,
        payload: &[u8],
        calibration: Option<&Calibration>,
        cancel: &CancellationToken,
    ) -> (Option<Measurement>, StageReport) {
        let started = Instant::now();
        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            result = timeout(self.config.stage_timeout, self.measurer.measure(payload, calibration)) => Some(result),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (measurement, report) = match outcome {
            None => (
                None,
                StageReport::new(StageKind::Measurement, StageStatus::Cancelled, elapsed_ms),
            ),
            Some(Err(_)) => {
                warn!("Measurement for inspection {} timed out after {}ms", id, elapsed_ms);
                (
                    None,
                    StageReport::new(StageKind::Measurement, StageStatus::TimedOut, elapsed_ms)
                        .with_detail(format!(
                            "no result within {}ms",
                            self.config.stage_timeout.as_millis()
                        )),
                )
            }
            Some(Ok(Err(err))) => {
                warn!("Measurement for inspection {} failed: {}", id, err);
                (
                    None,
                    StageReport::new(StageKind::Measurement, StageStatus::Failed, elapsed_ms)
                        .with_detail(err.to_string()),
                )
            }
            Some(Ok(Ok(MeasurementOutcome::Unavailable { reason }))) => {
                debug!("Measurement unavailable for inspection {}: {}", id, reason);
                (
                    None,
                    StageReport::new(StageKind::Measurement, StageStatus::Unavailable, elapsed_ms)
                        .with_detail(reason),
                )
            }
            Some(Ok(Ok(MeasurementOutcome::Measured(measurement)))) => (
                Some(measurement),
                StageReport::new(StageKind::Measurement, StageStatus::Succeeded, elapsed_ms),
            ),
        };

        let _ = self.events.send(InspectionEvent::StageFinished {
            inspection_id: id,
            stage: StageKind::Measurement,
            status: report.status,
        });
        (measurement, report)
    }

    /// Merge stage results into a terminal inspection, release the slot
    /// and record the snapshot in history.
    #[allow(clippy::too_many_arguments)]
    async fn finalize(
        &self,
        id: Uuid,
        slot: &str,
        defects: Option<Vec<Defect>>,
        detection_report: StageReport,
        measurement: Option<Measurement>,
        measurement_report: StageReport,
        cancel: &CancellationToken,
    ) {
        // Thresholds are snapshotted here: the verdict is frozen with the
        // values in force at finalize time.
        let thresholds = self.thresholds.read().await.clone();

        // Status, data and stage reports land in one registry write so no
        // reader ever observes a partially finalized inspection.
        let finalized = {
            let mut inspections = self.inspections.write().await;
            let Some(inspection) = inspections.get_mut(&id) else {
                warn!("Inspection {} disappeared before finalization", id);
                return;
            };

            inspection.record_stage(detection_report.clone());
            inspection.record_stage(measurement_report.clone());

            let result = if cancel.is_cancelled() {
                inspection.fail(InspectionFailure::Cancelled)
            } else if detection_report.status.is_failure()
                && measurement_report.status.is_failure()
            {
                // No stage produced anything to judge the part by
                let detail = format!(
                    "detection: {}; measurement: {}",
                    detection_report
                        .detail
                        .as_deref()
                        .unwrap_or_else(|| detection_report.status.as_str()),
                    measurement_report
                        .detail
                        .as_deref()
                        .unwrap_or_else(|| measurement_report.status.as_str()),
                );
                inspection.fail(InspectionFailure::Pipeline { detail })
            } else {
                let verdict =
                    PolicyEvaluator::evaluate(defects.as_deref(), measurement.as_ref(), &thresholds);
                inspection.complete(verdict, defects, measurement)
            };

            if let Err(reason) = result {
                warn!("Could not finalize inspection {}: {}", id, reason);
            }
            inspection.clone()
        };

        // Release the slot, but only if this inspection still holds it
        {
            let mut slots = self.slots.lock().await;
            if slots
                .get(slot)
                .is_some_and(|claim| claim.inspection_id == id)
            {
                slots.remove(slot);
            }
        }

        // Record the snapshot. Append is idempotent by id, so a repeated
        // finalize attempt could never duplicate an entry.
        match HistoryEntry::from_inspection(&finalized) {
            Ok(entry) => {
                match self.history.append(&entry).await {
                    Ok(true) => debug!("Inspection {} recorded in history", id),
                    Ok(false) => debug!("Inspection {} was already in history", id),
                    Err(err) => warn!("Failed to record inspection {} in history: {}", id, err),
                }
                if let Some(keep) = self.config.history_retention {
                    if let Err(err) = self.history.prune(keep).await {
                        warn!("History prune failed: {}", err);
                    }
                }
            }
            Err(reason) => warn!("Could not snapshot inspection {}: {}", id, reason),
        }

        let _ = self.events.send(InspectionEvent::Finalized {
            inspection_id: id,
            status: finalized.status,
            verdict: finalized.verdict,
        });
        info!(
            "Inspection {} finalized as {}",
            id,
            finalized.status.as_str()
        );
    }
}
