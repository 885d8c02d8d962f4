use anyhow::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;

use super::invoker::ScriptInvoker;
use super::platform::{Platform, find_script};
use crate::models::{
    Configuration, GlobalState, Manifest, RecordStatus, RehydrationRecord, SystemStatus,
};
use crate::state::StateStore;

/// Pre-flight errors that stop a rehydration before any record is created.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("No script found for platform: {0}")]
    NoScriptForPlatform(Platform),
}

/// Caller-supplied options for [`Coordinator::rehydrate`].
///
/// `None` fields take their value from the [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct RehydrateRequest {
    pub environment: Option<String>,
    pub verify_integrity: Option<bool>,
    pub force: bool,
}

/// Structured outcome of a rehydration call.
#[derive(Debug, Clone, Serialize)]
pub struct RehydrationResult {
    pub success: bool,
    pub skipped: bool,
    pub message: String,
    pub environment: String,
    pub verify_integrity: bool,

    /// The appended history record; absent when skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RehydrationRecord>,
}

/// Read-only projection of [`GlobalState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub system_status: SystemStatus,
    pub active_environments: IndexSet<String>,
    pub last_rehydration: Option<DateTime<Utc>>,
    pub total_rehydrations: usize,
}

/// Orchestrates rehydration attempts.
///
/// The coordinator owns the read-only inputs (configuration, manifest, resolved
/// platform) and the collaborators (invoker, store). The mutable [`GlobalState`]
/// is owned by the caller and passed into each operation; every mutation is
/// persisted through the store before the operation returns.
///
/// # Attempt Lifecycle
///
/// 1. Resolve environment and verification flag from the request or configuration
/// 2. Skip if the environment is already hydrated and `force` is not set
/// 3. Look up the platform script; a missing entry is a [`CoordinatorError`]
/// 4. Run the script and finalize an in-memory record as `success`, `failed` or `error`
/// 5. Append the record and save the state exactly once
pub struct Coordinator {
    config: Configuration,
    manifest: Manifest,
    invoker: ScriptInvoker,
    store: StateStore,
    platform: Platform,
}

impl Coordinator {
    /// Create a coordinator for the running host's platform.
    pub fn new(
        config: Configuration,
        manifest: Manifest,
        invoker: ScriptInvoker,
        store: StateStore,
    ) -> Self {
        Self {
            config,
            manifest,
            invoker,
            store,
            platform: Platform::resolve(),
        }
    }

    /// Override the resolved platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Environment and verification flag for `request`, with configuration defaults applied.
    pub fn resolve_request(&self, request: &RehydrateRequest) -> (String, bool) {
        let environment = request
            .environment
            .clone()
            .unwrap_or_else(|| self.config.default_environment.clone());
        let verify_integrity = request
            .verify_integrity
            .unwrap_or(self.config.verify_integrity_by_default);
        (environment, verify_integrity)
    }

    /// Run a rehydration attempt against `state`.
    ///
    /// # Errors
    ///
    /// Only pre-flight problems and persistence failures are returned as errors:
    /// [`CoordinatorError::NoScriptForPlatform`] when the manifest has no entry for
    /// the platform, or an I/O error from saving state. Script failures and
    /// invocation errors are reported through the returned [`RehydrationResult`]
    /// and recorded in history.
    pub async fn rehydrate(
        &self,
        state: &mut GlobalState,
        request: RehydrateRequest,
    ) -> Result<RehydrationResult> {
        let (environment, verify_integrity) = self.resolve_request(&request);

        tracing::info!(
            "Rehydration requested: environment={}, verify_integrity={}, platform={}, force={}",
            environment,
            verify_integrity,
            self.platform,
            request.force
        );

        if !request.force && state.is_hydrated(&environment) {
            tracing::warn!(
                "Environment '{}' is already hydrated, skipping",
                environment
            );
            return Ok(RehydrationResult {
                success: true,
                skipped: true,
                message: "Already hydrated".to_string(),
                environment,
                verify_integrity,
                record: None,
            });
        }

        let entry = find_script(&self.manifest, self.platform)
            .ok_or(CoordinatorError::NoScriptForPlatform(self.platform))?;

        tracing::debug!(
            "Retry and timeout settings are not applied: max_retry_attempts={}, timeout_seconds={}",
            self.config.max_retry_attempts,
            self.config.timeout_seconds
        );

        let mut record = RehydrationRecord::started(&environment, self.platform, verify_integrity);

        let (success, message) = match self
            .invoker
            .invoke(entry, self.platform, &environment, verify_integrity)
            .await
        {
            Ok(execution) => {
                record.status = if execution.success {
                    RecordStatus::Success
                } else {
                    RecordStatus::Failed
                };
                record.returncode = Some(execution.returncode);
                record.output = Some(execution.stdout);
                record.stderr = Some(execution.stderr);

                if execution.success {
                    state.mark_hydrated(&environment, Utc::now());
                    tracing::info!("Rehydration of '{}' completed", environment);
                    (true, "Rehydration completed".to_string())
                } else {
                    tracing::warn!(
                        "Rehydration of '{}' failed with exit code {}",
                        environment,
                        execution.returncode
                    );
                    (false, "Rehydration failed".to_string())
                }
            }
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::error!("Error during rehydration of '{}': {}", environment, error);
                record.status = RecordStatus::Error;
                record.error = Some(error.clone());
                (false, format!("Error: {}", error))
            }
        };

        debug_assert!(record.status.is_terminal());
        state.rehydration_history.push(record.clone());
        self.store.save(state)?;

        Ok(RehydrationResult {
            success,
            skipped: false,
            message,
            environment,
            verify_integrity,
            record: Some(record),
        })
    }

    /// Summarize `state` without modifying it.
    pub fn status(&self, state: &GlobalState) -> StatusReport {
        StatusReport {
            system_status: state.system_status,
            active_environments: state.active_environments.clone(),
            last_rehydration: state.last_rehydration,
            total_rehydrations: state.rehydration_history.len(),
        }
    }

    /// The last `limit` history records, oldest first. `None` or `0` returns all.
    pub fn history<'a>(
        &self,
        state: &'a GlobalState,
        limit: Option<usize>,
    ) -> &'a [RehydrationRecord] {
        state.recent_history(limit.unwrap_or(0))
    }

    /// Replace `state` with the uninitialized defaults and persist it.
    pub fn reset(&self, state: &mut GlobalState) -> Result<()> {
        *state = GlobalState::default();
        self.store.save(state)?;
        tracing::info!("Global state reset");
        Ok(())
    }
}
