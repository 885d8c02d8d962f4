//! Services module - Business logic for rehydration.
//!
//! The services are **framework-agnostic**: nothing here parses arguments or
//! prints to the console, so the same coordinator can back the CLI or be
//! embedded elsewhere.
//!
//! # Components
//!
//! - [`Platform`] and [`find_script`]: Resolve the host to `windows` or `linux`
//!   and pick the first matching manifest entry
//! - [`ScriptInvoker`]: Build the interpreter command line and run the script,
//!   capturing exit code, stdout and stderr
//! - [`Coordinator`]: The rehydration state machine. Applies the idempotency
//!   gate, invokes the script, finalizes a history record and persists state
//!
//! # Usage Example
//!
//! ```ignore
//! use rehydrate::services::{Coordinator, RehydrateRequest, ScriptInvoker};
//!
//! let coordinator = Coordinator::new(config, manifest, ScriptInvoker::new(&base), store);
//! let mut state = store.load()?;
//! let result = coordinator
//!     .rehydrate(&mut state, RehydrateRequest { force: true, ..Default::default() })
//!     .await?;
//! ```
//!
//! # Script Contract
//!
//! Scripts receive the environment name and an optional verification flag in
//! their platform's native convention. Exit code `0` means success; any other
//! code is recorded as `failed`. Both output streams are stored in the history
//! record verbatim.

pub mod coordinator;
pub mod invoker;
pub mod platform;

pub use coordinator::{
    Coordinator, CoordinatorError, RehydrateRequest, RehydrationResult, StatusReport,
};
pub use invoker::{ExecutionResult, InvokeError, ScriptCommand, ScriptInvoker};
pub use platform::{Platform, find_script};
