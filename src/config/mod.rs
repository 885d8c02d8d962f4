use crate::models::{Configuration, Manifest};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// Default configuration file name inside the base directory.
pub const CONFIG_FILE_NAME: &str = "global_config.yaml";

/// Default manifest file name inside the base directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Prefix for environment variable overrides (`REHYDRATE_DEFAULT_ENVIRONMENT`, ...).
pub const ENV_PREFIX: &str = "REHYDRATE";

/// Errors raised for malformed configuration inputs.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Configuration is corrupt: {path}: {source}")]
    CorruptConfig {
        path: Utf8PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Manifest is corrupt: {path}: {source}")]
    CorruptManifest {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration manager for the coordinator's input files.
///
/// Manages two files relative to a base directory:
/// - Configuration (`global_config.yaml`): coordinator settings, optional
/// - Manifest (`manifest.json`): platform script registry, read-only
///
/// Script paths listed in the manifest are resolved against the same base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
    manifest_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at `base_dir`.
    ///
    /// Nothing is created on disk until [`save_config`](Self::save_config) is called.
    pub fn new<P: AsRef<Utf8Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            config_path: base_dir.join(CONFIG_FILE_NAME),
            manifest_path: base_dir.join(MANIFEST_FILE_NAME),
            base_dir,
        }
    }

    /// Use a configuration file outside the base directory.
    pub fn with_config_path<P: AsRef<Utf8Path>>(mut self, config_path: P) -> Self {
        self.config_path = config_path.as_ref().to_path_buf();
        self
    }

    /// Load the configuration.
    ///
    /// The YAML file is optional. Values from `REHYDRATE_*` environment variables
    /// override the file, and any field still unset takes its default.
    ///
    /// # Errors
    /// [`ConfigFileError::CorruptConfig`] if the file cannot be parsed or a value
    /// has the wrong type
    pub fn load_config(&self) -> Result<Configuration> {
        let corrupt = |source| ConfigFileError::CorruptConfig {
            path: self.config_path.clone(),
            source,
        };

        let config: Configuration = config::Config::builder()
            .add_source(
                config::File::from(self.config_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(corrupt)?
            .try_deserialize()
            .map_err(corrupt)?;

        Ok(config)
    }

    /// Log where `config` came from.
    ///
    /// The log filter is derived from the loaded configuration, so this runs
    /// once logging is installed rather than inside [`load_config`](Self::load_config).
    pub fn log_config_source(&self, config: &Configuration) {
        if self.config_path.exists() {
            tracing::info!("Loaded config from {}", self.config_path);
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }
        tracing::info!(
            "Config: default_environment={}, verify_integrity_by_default={}, log_level={}",
            config.default_environment,
            config.verify_integrity_by_default,
            config.log_level
        );
    }

    /// Save the configuration file.
    ///
    /// # Arguments
    /// * `config` - The Configuration to save
    pub fn save_config(&self, config: &Configuration) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent))?;
            }
        }

        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Load the script manifest.
    ///
    /// # Returns
    /// The loaded Manifest, or an empty one if the file doesn't exist
    pub fn load_manifest(&self) -> Result<Manifest> {
        if !self.manifest_path.exists() {
            tracing::warn!(
                "Manifest not found at {}, no scripts registered",
                self.manifest_path
            );
            return Ok(Manifest::default());
        }

        let file_contents = fs::read_to_string(&self.manifest_path)
            .with_context(|| format!("Failed to read manifest: {}", self.manifest_path))?;

        let manifest: Manifest = serde_json::from_str(&file_contents).map_err(|source| {
            ConfigFileError::CorruptManifest {
                path: self.manifest_path.clone(),
                source,
            }
        })?;

        tracing::info!(
            "Loaded manifest from {} ({} scripts)",
            self.manifest_path,
            manifest.scripts.len()
        );
        Ok(manifest)
    }

    /// Base directory that script paths are resolved against.
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    pub fn manifest_path(&self) -> &Utf8Path {
        &self.manifest_path
    }
}
