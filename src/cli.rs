use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::services::RehydrateRequest;

#[derive(Parser, Debug)]
#[command(
    name = "rehydrate",
    version,
    about = "Global Rehydration System - Unified cross-platform rehydration coordinator"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Directory holding the manifest, state file and scripts"
    )]
    pub base_dir: Utf8PathBuf,
    #[arg(
        long,
        global = true,
        help = "Configuration file (default: <base-dir>/global_config.yaml)"
    )]
    pub config: Option<Utf8PathBuf>,
    #[arg(long, global = true, help = "Log directory (default: <base-dir>/logs)")]
    pub log_dir: Option<Utf8PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, global = true, help = "Debug logging, mirrored to stderr")]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Perform global rehydration
    Rehydrate(RehydrateArgs),
    /// Get current system status
    Status,
    /// View rehydration history
    History {
        #[arg(short, long, default_value_t = 10, help = "Number of history entries to display")]
        limit: usize,
    },
    /// Reset global state
    Reset {
        #[arg(long, help = "Confirm reset operation")]
        confirm: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct RehydrateArgs {
    #[arg(
        short,
        long,
        help = "Target environment (e.g., production, staging, development)"
    )]
    pub environment: Option<String>,
    #[arg(
        short,
        long,
        conflicts_with = "no_verify",
        help = "Verify system integrity after rehydration"
    )]
    pub verify: bool,
    #[arg(long, help = "Skip system integrity verification")]
    pub no_verify: bool,
    #[arg(short, long, help = "Force rehydration even if already hydrated")]
    pub force: bool,
}

impl RehydrateArgs {
    /// `None` when neither flag was given, so the configured default applies.
    pub fn verify_override(&self) -> Option<bool> {
        if self.verify {
            Some(true)
        } else if self.no_verify {
            Some(false)
        } else {
            None
        }
    }

    pub fn to_request(&self) -> RehydrateRequest {
        RehydrateRequest {
            environment: self.environment.clone(),
            verify_integrity: self.verify_override(),
            force: self.force,
        }
    }
}
