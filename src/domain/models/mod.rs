pub mod calibration;
pub mod config;
pub mod defect;
pub mod history;
pub mod inspection;
pub mod measurement;
pub mod submission;

pub use calibration::Calibration;
pub use config::{
    DatabaseConfig, EngineConfig, HistoryConfig, LoggingConfig, PolicyThresholds, StageConfig,
};
pub use defect::Defect;
pub use history::HistoryEntry;
pub use inspection::{
    Inspection, InspectionFailure, InspectionStatus, StageKind, StageReport, StageStatus, Verdict,
};
pub use measurement::{Measurement, MeasurementOutcome, NominalDimensions};
pub use submission::{ImageSubmission, DEFAULT_SLOT};
