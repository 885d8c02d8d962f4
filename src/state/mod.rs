// State persistence module
//
// This module provides the StateStore which loads and saves GlobalState as a
// pretty-printed JSON document. Writes go to a temporary sibling file that is
// then renamed over the target so a crash never leaves a half-written file.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

use crate::models::GlobalState;

/// Default file name of the persisted state inside the base directory.
pub const STATE_FILE_NAME: &str = "global_state.json";

/// Errors raised while reading persisted state.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file is corrupt: {path}: {source}")]
    CorruptState {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable storage for [`GlobalState`].
///
/// The store holds no state of its own; callers load once, pass the state into
/// coordinator operations, and those operations save after each mutation.
/// There is no file locking: concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: Utf8PathBuf,
}

impl StateStore {
    /// Create a store backed by `path`.
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a store using [`STATE_FILE_NAME`] inside `base_dir`.
    pub fn in_dir<P: AsRef<Utf8Path>>(base_dir: P) -> Self {
        Self::new(base_dir.as_ref().join(STATE_FILE_NAME))
    }

    /// Load the persisted state.
    ///
    /// # Returns
    /// The stored state, or the uninitialized default if no file exists
    ///
    /// # Errors
    /// [`StoreError::CorruptState`] if the file exists but cannot be parsed
    pub fn load(&self) -> Result<GlobalState> {
        if !self.path.exists() {
            tracing::debug!("State file not found at {}, using defaults", self.path);
            return Ok(GlobalState::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path))?;

        let state: GlobalState =
            serde_json::from_str(&contents).map_err(|source| StoreError::CorruptState {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            "Loaded state from {} ({} history records)",
            self.path,
            state.rehydration_history.len()
        );
        Ok(state)
    }

    /// Overwrite the persisted state with `state`.
    pub fn save(&self, state: &GlobalState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create state directory: {}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write temp state file: {}", temp_path))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path))?;

        tracing::debug!("Saved state to {}", self.path);
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}
