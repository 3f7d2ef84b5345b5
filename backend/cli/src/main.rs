mod console;
mod demo;
mod wiring;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use herald_config::{
    apply_all_defaults, config_dir, config_file_path, load_and_prepare, write_config, HeraldConfig,
    ValidationReport,
};

use console::ConsoleClient;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "herald: a chat bot command router with an interactive console")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $HERALD_CONFIG_DIR/config.yaml or ~/.herald/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console bot; each stdin line is sent as a chat message
    Run,
    /// Write a config file with every default filled in
    Init {
        /// Overwrite an existing file (the old one is kept as a backup)
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the config, then print the findings
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Run => run(path).await,
        Commands::Init { force } => init(path, force).await,
        Commands::Check => check(path).await,
    }
}

async fn run(path: PathBuf) -> Result<()> {
    let (config, report) = load_and_prepare(&path).await?;

    herald_logging::init_logger(
        config.logging.dir.as_deref().unwrap_or("logs"),
        config.logging.level.as_deref().unwrap_or("info"),
        config.logging.json.unwrap_or(false),
    );
    log_findings(&report);
    if !report.is_valid() {
        bail!("config at {} is invalid", path.display());
    }

    info!(config = %path.display(), "Starting herald");

    let presets = wiring::build_presets(&config);
    let router = wiring::build_router(&config, &presets)?;
    demo::register_all(&router, &presets);

    let client = Arc::new(ConsoleClient::new(&config.console));
    router.set_bot_user(client.bot.clone());

    console::run_console(router, client).await?;
    info!("Console closed; shutting down");
    Ok(())
}

async fn init(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    let config = apply_all_defaults(HeraldConfig::default());
    write_config(&config, &path).await?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn check(path: PathBuf) -> Result<()> {
    let (_config, report) = load_and_prepare(&path).await?;
    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &report.errors {
        println!("error: {}: {}", err.path, err.message);
    }
    if !report.is_valid() {
        bail!("{} error(s) in {}", report.errors.len(), path.display());
    }
    println!("{} is valid", path.display());
    Ok(())
}

/// Findings are gathered before the subscriber exists, so they are replayed
/// once logging is up.
fn log_findings(report: &ValidationReport) {
    for finding in &report.warnings {
        warn!(path = %finding.path, message = %finding.message, "Config warning");
    }
    for finding in &report.errors {
        error!(path = %finding.path, message = %finding.message, "Config error");
    }
}
