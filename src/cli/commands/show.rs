//! Implementation of the `ferroscan show` command.

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::HistoryEntry;
use crate::domain::ports::HistoryRepository;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Inspection ID
    pub inspection_id: Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct ShowOutput {
    #[serde(flatten)]
    pub entry: HistoryEntry,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let entry = &self.entry;
        let mut lines = vec![
            format!("Inspection {}", entry.id),
            format!("  Slot: {}", entry.slot),
        ];
        if let Some(part_label) = &entry.part_label {
            lines.push(format!("  Part: {part_label}"));
        }
        lines.push(format!("  Status: {}", entry.status.as_str()));
        lines.push(format!(
            "  Verdict: {}",
            entry.verdict.map_or("-", |v| v.as_str())
        ));
        lines.push(format!("  Defects: {}", entry.defect_count));
        if let Some(measurement) = &entry.measurement {
            lines.push(format!(
                "  Measured: {:.2}mm x {:.2}mm",
                measurement.length_mm, measurement.width_mm
            ));
        }
        lines.push(format!(
            "  Submitted: {}",
            entry.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!(
            "  Completed: {}",
            entry.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.entry).unwrap_or_default()
    }
}

pub async fn execute(args: ShowArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let history = super::open_history(&config).await?;

    let entry = history
        .get(args.inspection_id)
        .await
        .context("Failed to read inspection history")?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Inspection {} not found. Use 'ferroscan history' to see recorded inspections.",
                args.inspection_id
            )
        })?;

    output(&ShowOutput { entry }, json_mode);
    Ok(())
}
