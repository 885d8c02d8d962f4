//! Data models for the rehydration coordinator.
//!
//! This module contains the serializable structures shared by every layer:
//! - [`Configuration`]: User settings loaded from `global_config.yaml`
//! - [`Manifest`]: Platform to script registry loaded from `manifest.json`
//! - [`GlobalState`]: Status, active environments and history persisted to `global_state.json`
//! - [`RehydrationRecord`]: One entry in the append-only rehydration history
//!
//! # Architecture Note
//!
//! The models are plain data:
//! - **Serializable**: All structs derive `Serialize`/`Deserialize` for persistence
//! - **Owned by the caller**: [`GlobalState`] is passed explicitly into each
//!   [`Coordinator`](crate::services::Coordinator) operation; nothing is held globally

pub mod config;
pub mod state;

pub use config::{Configuration, Manifest, ScriptEntry};
pub use state::{GlobalState, RecordStatus, RehydrationRecord, SystemStatus};
