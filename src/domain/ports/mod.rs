//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - Detector: surface defect detection on image payloads
//! - Measurer: dimensional measurement on image payloads
//! - HistoryRepository: persistence of finalized inspection snapshots
//!
//! These traits define the contracts that allow the domain to be independent
//! of specific infrastructure implementations.

pub mod detector;
pub mod history_repository;
pub mod measurer;

pub use detector::Detector;
pub use history_repository::{HistoryFilter, HistoryRepository, HistorySummary};
pub use measurer::Measurer;
