//! Implementation of the `ferroscan summary` command.

use anyhow::{Context, Result};

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::ports::{HistoryRepository, HistorySummary};
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, serde::Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: HistorySummary,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_summary(&self.summary)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.summary).unwrap_or_default()
    }
}

pub async fn execute(json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let history = super::open_history(&config).await?;

    let summary = history
        .summary()
        .await
        .context("Failed to summarize inspection history")?;

    output(&SummaryOutput { summary }, json_mode);
    Ok(())
}
