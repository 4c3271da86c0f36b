//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

pub use commands::history::HistoryArgs;
pub use commands::init::InitArgs;
pub use commands::inspect::InspectArgs;
pub use commands::show::ShowArgs;

#[derive(Parser)]
#[command(name = "ferroscan")]
#[command(about = "Ferroscan - automated visual inspection for machined parts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Ferroscan configuration and history database
    Init(InitArgs),

    /// Inspect a part image and wait for the verdict
    Inspect(InspectArgs),

    /// Show one recorded inspection
    Show(ShowArgs),

    /// List recorded inspections, newest first
    History(HistoryArgs),

    /// Show aggregate counts over the recorded history
    Summary,
}

/// Print a command error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
