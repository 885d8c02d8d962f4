use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::services::Platform;

/// Overall hydration status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    #[default]
    Uninitialized,
    Hydrated,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Hydrated => "hydrated",
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single rehydration attempt.
///
/// `InProgress` only exists in memory; persisted records are always terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    InProgress,
    Success,
    Failed,
    Error,
}

impl RecordStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the rehydration history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehydrationRecord {
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub platform: Platform,
    pub verify_integrity: bool,
    pub status: RecordStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,

    /// Captured stdout of the script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RehydrationRecord {
    /// Start a new attempt stamped with the current time.
    pub fn started(environment: &str, platform: Platform, verify_integrity: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            environment: environment.to_string(),
            platform,
            verify_integrity,
            status: RecordStatus::InProgress,
            returncode: None,
            output: None,
            stderr: None,
            error: None,
        }
    }
}

/// Durable coordinator state.
///
/// Missing fields in a persisted file fall back to the uninitialized defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalState {
    pub system_status: SystemStatus,
    pub last_rehydration: Option<DateTime<Utc>>,
    pub active_environments: IndexSet<String>,
    pub rehydration_history: Vec<RehydrationRecord>,
}

impl GlobalState {
    /// True when `environment` was hydrated since the last reset.
    pub fn is_hydrated(&self, environment: &str) -> bool {
        self.system_status == SystemStatus::Hydrated
            && self.active_environments.contains(environment)
    }

    /// Mark a successful rehydration of `environment` at `at`.
    pub fn mark_hydrated(&mut self, environment: &str, at: DateTime<Utc>) {
        self.last_rehydration = Some(at);
        self.system_status = SystemStatus::Hydrated;
        self.active_environments.insert(environment.to_string());
    }

    /// The most recent `limit` records, oldest first. `0` returns everything.
    pub fn recent_history(&self, limit: usize) -> &[RehydrationRecord] {
        let history = &self.rehydration_history;
        if limit == 0 || limit >= history.len() {
            history
        } else {
            &history[history.len() - limit..]
        }
    }
}
