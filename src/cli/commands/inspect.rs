//! Implementation of the `ferroscan inspect` command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::output::progress::create_spinner;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{
    ImageSubmission, Inspection, InspectionFailure, Verdict, DEFAULT_SLOT,
};
use crate::infrastructure::config::ConfigLoader;
use crate::services::InspectionEvent;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the part image (PNG or JPEG)
    pub image: PathBuf,

    /// Inspection slot to claim
    #[arg(short, long, default_value = DEFAULT_SLOT)]
    pub slot: String,

    /// Operator-facing label for the part
    #[arg(short, long = "part")]
    pub part_label: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct InspectOutput {
    #[serde(flatten)]
    pub inspection: Inspection,
}

impl CommandOutput for InspectOutput {
    fn to_human(&self) -> String {
        let inspection = &self.inspection;
        let mut lines = vec![
            format!("Inspection {}", inspection.id),
            format!("  Slot: {}", inspection.slot),
        ];
        if let Some(part_label) = &inspection.part_label {
            lines.push(format!("  Part: {part_label}"));
        }
        lines.push(format!("  Status: {}", inspection.status.as_str()));
        lines.push(format!("  Verdict: {}", verdict_display(inspection.verdict)));

        if !inspection.stage_reports.is_empty() {
            lines.push("  Stages:".to_string());
            for report in &inspection.stage_reports {
                let mut line = format!(
                    "    {:<12} {:<12} {}ms",
                    report.stage.as_str(),
                    report.status.as_str(),
                    report.elapsed_ms
                );
                if let Some(detail) = &report.detail {
                    line.push_str(&format!("  {detail}"));
                }
                lines.push(line);
            }
        }

        match inspection.defects.as_deref() {
            Some([]) => lines.push("  Defects: none".to_string()),
            Some(defects) => {
                lines.push(format!("  Defects: {}", defects.len()));
                for defect in defects {
                    lines.push(format!(
                        "    - {} (confidence {:.2}) at {}",
                        defect.defect_type, defect.confidence, defect.location
                    ));
                }
            }
            None => {}
        }

        if let Some(measurement) = &inspection.measurement {
            lines.push(format!(
                "  Measured: {:.2}mm x {:.2}mm",
                measurement.length_mm, measurement.width_mm
            ));
            if let Some(deviation) = measurement.deviation_mm {
                lines.push(format!("  Deviation from nominal: {deviation:.3}mm"));
            }
        }

        if let Some(failure) = &inspection.failure {
            let line = match failure {
                InspectionFailure::Pipeline { detail } => format!("  Failure: pipeline ({detail})"),
                InspectionFailure::Cancelled => "  Failure: cancelled".to_string(),
            };
            lines.push(line);
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.inspection).unwrap_or_default()
    }
}

fn verdict_display(verdict: Option<Verdict>) -> String {
    match verdict {
        Some(Verdict::Passed) => style("passed").green().bold().to_string(),
        Some(Verdict::Failed) => style("failed").red().bold().to_string(),
        Some(Verdict::Undetermined) => style("undetermined").yellow().to_string(),
        None => "-".to_string(),
    }
}

pub async fn execute(args: InspectArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let engine = super::build_engine(&config).await?;

    let payload = fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;

    let mut submission = ImageSubmission::new(payload).with_slot(&args.slot);
    if let Some(part_label) = &args.part_label {
        submission = submission.with_part_label(part_label);
    }

    let spinner = if json_mode {
        None
    } else {
        let spinner = create_spinner();
        spinner.set_message("Inspecting...");
        Some(spinner)
    };

    // Subscribe first so the finalization event cannot be missed.
    let mut events = engine.subscribe();
    let inspection_id = engine
        .submit(submission)
        .await
        .context("Inspection was rejected")?;

    loop {
        match events.recv().await {
            Ok(InspectionEvent::Finalized { inspection_id: id, .. }) if id == inspection_id => {
                break;
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let inspection = engine
        .status(inspection_id)
        .await
        .context("Failed to fetch the finished inspection")?;

    output(&InspectOutput { inspection }, json_mode);
    Ok(())
}
