//! Ferroscan CLI entry point.

use clap::Parser;

use ferroscan::cli::{commands, handle_error, Cli, Commands};
use ferroscan::infrastructure::config::ConfigLoader;
use ferroscan::infrastructure::logging::init_tracing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Before `init` runs there may be no config file yet; fall back to
    // default logging rather than refusing to start.
    let logging = ConfigLoader::load().map(|c| c.logging).unwrap_or_default();
    if let Err(err) = init_tracing(&logging) {
        eprintln!("Failed to initialize logging: {err:#}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Inspect(args) => commands::inspect::execute(args, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, cli.json).await,
        Commands::History(args) => commands::history::execute(args, cli.json).await,
        Commands::Summary => commands::summary::execute(cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
