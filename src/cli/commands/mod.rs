//! CLI command implementations.

pub mod history;
pub mod init;
pub mod inspect;
pub mod show;
pub mod summary;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::{initialize_database, SqliteHistoryRepository};
use crate::adapters::stages::{ExtentMeasurer, LuminanceDetector};
use crate::domain::models::EngineConfig;
use crate::services::{InspectionOrchestrator, OrchestratorConfig};

/// Open the configured history database, creating it if needed.
pub(crate) async fn open_history(config: &EngineConfig) -> Result<SqliteHistoryRepository> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to open history database")?;
    Ok(SqliteHistoryRepository::new(pool))
}

/// Wire the inspection engine with the built-in stages and the
/// configured history database.
pub(crate) async fn build_engine(config: &EngineConfig) -> Result<InspectionOrchestrator> {
    let history = Arc::new(open_history(config).await?);
    let engine = InspectionOrchestrator::new(
        Arc::new(LuminanceDetector::new()),
        Arc::new(ExtentMeasurer::new()),
        history,
        OrchestratorConfig::from_engine(config),
    )
    .with_thresholds(config.thresholds.clone())
    .with_calibration(config.calibration.clone());
    Ok(engine)
}
