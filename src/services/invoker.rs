use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

use super::platform::Platform;
use crate::models::ScriptEntry;

/// Outcome of running a rehydration script to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Errors that prevent a script from running at all.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Script not found: {0}")]
    ScriptNotFound(Utf8PathBuf),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A fully built command line for a platform script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs platform rehydration scripts as child processes.
///
/// Script paths in the manifest are relative to `base_dir`. The invoker applies
/// no timeout and no retry; the child runs until it exits.
///
/// # Command Lines
///
/// - Windows: `powershell -ExecutionPolicy Bypass -File <script> -Environment <env> [-VerifyIntegrity]`
/// - Linux: `bash <script> --environment=<env> [--verify]`
#[derive(Debug, Clone)]
pub struct ScriptInvoker {
    base_dir: Utf8PathBuf,
}

impl ScriptInvoker {
    pub fn new<P: AsRef<Utf8Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Absolute-or-base-relative location of a manifest entry's script.
    pub fn script_path(&self, entry: &ScriptEntry) -> Utf8PathBuf {
        self.base_dir.join(&entry.path)
    }

    /// Build the interpreter invocation for `script_path` on `platform`.
    pub fn build_command(
        &self,
        platform: Platform,
        script_path: &Utf8Path,
        environment: &str,
        verify_integrity: bool,
    ) -> ScriptCommand {
        match platform {
            Platform::Windows => {
                let mut args = vec![
                    "-ExecutionPolicy".to_string(),
                    "Bypass".to_string(),
                    "-File".to_string(),
                    script_path.to_string(),
                    "-Environment".to_string(),
                    environment.to_string(),
                ];
                if verify_integrity {
                    args.push("-VerifyIntegrity".to_string());
                }
                ScriptCommand {
                    program: "powershell".to_string(),
                    args,
                }
            }
            Platform::Linux => {
                let mut args = vec![
                    script_path.to_string(),
                    format!("--environment={}", environment),
                ];
                if verify_integrity {
                    args.push("--verify".to_string());
                }
                ScriptCommand {
                    program: "bash".to_string(),
                    args,
                }
            }
        }
    }

    /// Run the script registered in `entry` and capture its output.
    ///
    /// # Errors
    ///
    /// [`InvokeError::ScriptNotFound`] when the script file is missing and
    /// [`InvokeError::Spawn`] when the interpreter cannot be started. A script
    /// that runs and exits nonzero is not an error.
    pub async fn invoke(
        &self,
        entry: &ScriptEntry,
        platform: Platform,
        environment: &str,
        verify_integrity: bool,
    ) -> Result<ExecutionResult> {
        let script_path = self.script_path(entry);
        if !script_path.exists() {
            return Err(InvokeError::ScriptNotFound(script_path).into());
        }

        let command = self.build_command(platform, &script_path, environment, verify_integrity);
        tracing::info!("Executing: {}", command);

        let start = Instant::now();

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| InvokeError::Spawn {
                program: command.program.clone(),
                source,
            })
            .with_context(|| format!("Failed to run script: {}", script_path))?;

        let returncode = output.status.code().unwrap_or(-1);

        tracing::info!(
            "Script completed in {:.2}s with exit code {}",
            start.elapsed().as_secs_f32(),
            returncode
        );

        Ok(ExecutionResult {
            success: returncode == 0,
            returncode,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
