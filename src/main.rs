//! Rehydrate - Cross-platform global rehydration coordinator
//!
//! Main entry point for the CLI.
//!
//! # Execution Flow
//!
//! 1. Parse arguments; with no subcommand print help and exit 1
//! 2. Load configuration from `<base-dir>/global_config.yaml` (or `--config`)
//! 3. Initialize logging → `<log-dir>/rehydrate.<date>`, then log the config source
//! 4. Load the manifest and persisted state
//! 5. Run the subcommand on a current-thread tokio runtime
//!
//! # Files
//!
//! Expected in the base directory:
//! - `manifest.json`: Platform to script registry
//! - `global_state.json`: Status and history, created on first mutation
//! - `global_config.yaml`: Settings (optional)

use anyhow::Result;
use clap::{CommandFactory, Parser};
use rehydrate::cli::Cli;
use rehydrate::{APP_NAME, ConfigManager, Coordinator, ScriptInvoker, StateStore, VERSION};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    let mut config_manager = ConfigManager::new(&cli.base_dir);
    if let Some(config_path) = &cli.config {
        config_manager = config_manager.with_config_path(config_path);
    }
    let config = config_manager.load_config()?;

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| cli.base_dir.join("logs"));
    let filter = rehydrate::logging::build_filter(cli.debug, &config.log_filter());
    let _log_guard = rehydrate::logging::setup_logging(&log_dir, APP_NAME, filter, cli.debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config_manager.log_config_source(&config);

    let manifest = config_manager.load_manifest()?;
    let store = StateStore::in_dir(config_manager.base_dir());
    let mut state = store.load()?;

    let coordinator = Coordinator::new(
        config,
        manifest,
        ScriptInvoker::new(config_manager.base_dir()),
        store,
    );

    // Script execution is awaited inline; one operation per process
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let exit_code = runtime.block_on(rehydrate::commands::run(
        command,
        &coordinator,
        &mut state,
        cli.json,
    ));

    match &exit_code {
        Ok(_) => tracing::info!("Command finished"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    exit_code
}
