// Rehydrate - Cross-platform global rehydration coordinator
//
// This is the library crate containing the coordinator, persistence and data structures.
// The binary crate (main.rs) provides the CLI entry point.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{Configuration, GlobalState, Manifest, RehydrationRecord};
pub use services::{Coordinator, Platform, RehydrateRequest, RehydrationResult, ScriptInvoker};
pub use state::StateStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
