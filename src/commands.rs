//! Command handlers for the CLI boundary.
//!
//! Each handler drives one [`Coordinator`] operation and renders the outcome,
//! either as human-readable text or, with `--json`, as the structured result.
//! Handlers return the process exit code; errors that escape are pre-flight
//! failures (no script for the platform, corrupt files, persistence errors).

use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

use crate::cli::{Commands, RehydrateArgs};
use crate::models::{GlobalState, RecordStatus, RehydrationRecord};
use crate::services::{Coordinator, RehydrationResult, StatusReport};

const RULE_WIDTH: usize = 35;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dispatch a parsed subcommand.
pub async fn run(
    command: &Commands,
    coordinator: &Coordinator,
    state: &mut GlobalState,
    json: bool,
) -> Result<ExitCode> {
    match command {
        Commands::Rehydrate(args) => rehydrate(args, coordinator, state, json).await,
        Commands::Status => status(coordinator, state, json),
        Commands::History { limit } => history(*limit, coordinator, state, json),
        Commands::Reset { confirm } => reset(*confirm, coordinator, state, json),
    }
}

async fn rehydrate(
    args: &RehydrateArgs,
    coordinator: &Coordinator,
    state: &mut GlobalState,
    json: bool,
) -> Result<ExitCode> {
    let request = args.to_request();

    if !json {
        let (environment, verify_integrity) = coordinator.resolve_request(&request);
        println!("\n=== Global Rehydration System ===");
        println!("Environment: {}", environment);
        println!("Verify Integrity: {}", verify_integrity);
        println!("Platform: {}", coordinator.platform());
        println!("{}\n", rule());
    }

    let result = match coordinator.rehydrate(state, request).await {
        Ok(result) => result,
        Err(e) => {
            if !json {
                println!("\n✗ Error during rehydration: {:#}", e);
            }
            return Err(e);
        }
    };

    if json {
        print_json(&result)?;
    } else {
        print_rehydration(&result);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_rehydration(result: &RehydrationResult) {
    if result.skipped {
        println!(
            "Warning: Environment '{}' is already hydrated.",
            result.environment
        );
        println!("Use --force to rehydrate anyway.");
        return;
    }

    let Some(record) = &result.record else {
        println!("{}", result.message);
        return;
    };

    match record.status {
        RecordStatus::Success => println!("\n✓ Global rehydration completed successfully!"),
        RecordStatus::Failed => {
            println!("\n✗ Global rehydration failed!");
            println!("Error: {}", record.stderr.as_deref().unwrap_or_default());
        }
        RecordStatus::Error | RecordStatus::InProgress => {
            println!(
                "\n✗ Error during rehydration: {}",
                record.error.as_deref().unwrap_or(&result.message)
            );
        }
    }
}

fn status(coordinator: &Coordinator, state: &GlobalState, json: bool) -> Result<ExitCode> {
    let report = coordinator.status(state);

    if json {
        print_json(&report)?;
    } else {
        print_status(&report);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_status(report: &StatusReport) {
    let environments = if report.active_environments.is_empty() {
        "None".to_string()
    } else {
        report
            .active_environments
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let last = report
        .last_rehydration
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "Never".to_string());

    println!("\n=== Global Rehydration Status ===");
    println!("System Status: {}", report.system_status);
    println!("Active Environments: {}", environments);
    println!("Last Rehydration: {}", last);
    println!("Total Rehydrations: {}", report.total_rehydrations);
    println!("{}\n", rule());
}

fn history(
    limit: usize,
    coordinator: &Coordinator,
    state: &GlobalState,
    json: bool,
) -> Result<ExitCode> {
    let records = coordinator.history(state, Some(limit));

    if json {
        print_json(&records)?;
    } else {
        print_history(limit, records);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_history(limit: usize, records: &[RehydrationRecord]) {
    println!("\n=== Rehydration History (last {}) ===", limit);

    if records.is_empty() {
        println!("No rehydration history available.");
    } else {
        for (i, record) in records.iter().enumerate() {
            println!("\n{}. {}", i + 1, record.timestamp.to_rfc3339());
            println!("   Environment: {}", record.environment);
            println!("   Platform: {}", record.platform);
            println!("   Status: {}", record.status);
            if let Some(error) = &record.error {
                println!("   Error: {}", error);
            }
        }
    }

    println!("{}\n", rule());
}

fn reset(
    confirm: bool,
    coordinator: &Coordinator,
    state: &mut GlobalState,
    json: bool,
) -> Result<ExitCode> {
    if !confirm {
        if json {
            print_json(&serde_json::json!({
                "reset": false,
                "message": "Use --confirm to proceed with reset",
            }))?;
        } else {
            println!("Warning: This will reset all global state.");
            println!("Use --confirm to proceed with reset.");
        }
        return Ok(ExitCode::FAILURE);
    }

    coordinator.reset(state)?;

    if json {
        print_json(&serde_json::json!({ "reset": true }))?;
    } else {
        println!("Global state reset successfully.");
    }

    Ok(ExitCode::SUCCESS)
}
