//! Host platform resolution and manifest lookup.
//!
//! The coordinator only distinguishes two script families: PowerShell scripts on
//! Windows and bash scripts everywhere else. macOS and any unrecognized system
//! resolve to [`Platform::Linux`].
//!
//! # Examples
//!
//! ```ignore
//! use rehydrate::services::platform::{Platform, find_script};
//!
//! let platform = Platform::resolve();
//! let entry = find_script(&manifest, platform);
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Manifest, ScriptEntry};

/// Logical platform identifier used to select a rehydration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Resolve the platform of the running host.
    pub fn resolve() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an operating system name to a platform.
    ///
    /// Anything that is not Windows falls back to `Linux`, including `darwin`.
    pub fn from_os_name(os_name: &str) -> Self {
        if os_name.to_lowercase().contains("windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Name used in manifests and history records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the first manifest entry registered for `platform`.
///
/// Duplicate entries are not rejected; the earliest one wins.
pub fn find_script(manifest: &Manifest, platform: Platform) -> Option<&ScriptEntry> {
    let found = manifest
        .scripts
        .iter()
        .find(|entry| entry.platform == platform.as_str());

    match found {
        Some(entry) => tracing::debug!("Found {} script: {}", platform, entry.path),
        None => tracing::debug!("No script registered for platform {}", platform),
    }

    found
}
