//! Ferroscan - automated visual inspection for machined parts
//!
//! Ferroscan runs part images through two concurrent analysis stages,
//! defect detection and dimensional measurement, then judges the part
//! against configured acceptance thresholds and records the outcome in
//! a durable history store.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Inspection models, ports, and errors
//! - **Service Layer** (`services`): The orchestrator and policy evaluator
//! - **Adapters** (`adapters`): Stage implementations and history stores
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use ferroscan::adapters::memory::InMemoryHistoryRepository;
//! use ferroscan::adapters::stages::{ExtentMeasurer, LuminanceDetector};
//! use ferroscan::domain::models::ImageSubmission;
//! use ferroscan::services::{InspectionOrchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = InspectionOrchestrator::new(
//!         Arc::new(LuminanceDetector::new()),
//!         Arc::new(ExtentMeasurer::new()),
//!         Arc::new(InMemoryHistoryRepository::new()),
//!         OrchestratorConfig::default(),
//!     );
//!
//!     let id = engine.submit(ImageSubmission::new(load_image()?)).await?;
//!     let inspection = engine.status(id).await?;
//!     println!("{:?}", inspection.verdict);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Calibration, Defect, EngineConfig, HistoryEntry, ImageSubmission, Inspection,
    InspectionFailure, InspectionStatus, Measurement, MeasurementOutcome, PolicyThresholds,
    StageKind, StageReport, StageStatus, Verdict,
};
pub use domain::ports::{Detector, HistoryFilter, HistoryRepository, HistorySummary, Measurer};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{InspectionEvent, InspectionOrchestrator, OrchestratorConfig, PolicyEvaluator};
