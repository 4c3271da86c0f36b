//! Implementation of the `ferroscan init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::EngineConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization, replacing configuration and history
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub database_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push("Configuration written to .ferroscan/config.yaml".to_string());
        }
        if self.database_initialized {
            lines.push("History database initialized at .ferroscan/history.db".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let ferroscan_dir = target_path.join(".ferroscan");

    if ferroscan_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            config_written: false,
            database_initialized: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && ferroscan_dir.exists() {
        fs::remove_dir_all(&ferroscan_dir)
            .await
            .context("Failed to remove existing .ferroscan directory")?;
    }

    fs::create_dir_all(&ferroscan_dir)
        .await
        .with_context(|| format!("Failed to create {}", ferroscan_dir.display()))?;

    // Default configuration, ready for editing.
    let config = EngineConfig::default();
    let config_yaml =
        serde_yaml::to_string(&config).context("Failed to serialize default configuration")?;
    fs::write(ferroscan_dir.join("config.yaml"), config_yaml)
        .await
        .context("Failed to write .ferroscan/config.yaml")?;

    let mut database = config.database.clone();
    database.path = ferroscan_dir.join("history.db").display().to_string();
    initialize_database(&database)
        .await
        .context("Failed to initialize history database")?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        config_written: true,
        database_initialized: true,
    };

    output(&output_data, json_mode);
    Ok(())
}
