use serde::{Deserialize, Serialize};

/// Coordinator settings from `global_config.yaml`.
///
/// Every field falls back to its default when missing, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_environment")]
    pub default_environment: String,

    #[serde(default = "default_verify_integrity")]
    pub verify_integrity_by_default: bool,

    /// Loaded and reported but not applied to script invocation.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Loaded and reported but not applied to script invocation.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            default_environment: default_environment(),
            verify_integrity_by_default: default_verify_integrity(),
            max_retry_attempts: default_max_retry_attempts(),
            timeout_seconds: default_timeout_seconds(),
            log_level: default_log_level(),
        }
    }
}

impl Configuration {
    /// Log level as a `tracing` filter directive (`INFO` becomes `info`).
    ///
    /// `WARNING` and `CRITICAL` are accepted as aliases for `warn` and `error`.
    pub fn log_filter(&self) -> String {
        match self.log_level.trim().to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_verify_integrity() -> bool {
    true
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// Static registry of platform scripts from `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
}

/// A registered rehydration script.
///
/// `platform` stays a plain string so manifests naming platforms this build
/// does not know about still load; they simply never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub platform: String,

    /// Path relative to the base directory.
    pub path: String,
}
