//! Integration tests for the rehydration Coordinator
//!
//! These tests drive real bash scripts and verify:
//! - The idempotency gate and `force` override
//! - One terminal history record per attempted rehydration
//! - Failure and error recording without touching hydration status
//! - Persistence of every attempt through the StateStore

#![cfg(unix)]

use camino::Utf8PathBuf;
use rehydrate::models::{Manifest, RecordStatus, ScriptEntry, SystemStatus};
use rehydrate::services::{CoordinatorError, RehydrateRequest};
use rehydrate::{Configuration, Coordinator, GlobalState, Platform, ScriptInvoker, StateStore};
use std::fs;
use tempfile::TempDir;

struct Fixture {
    _temp_dir: TempDir,
    base: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        Self {
            _temp_dir: temp_dir,
            base,
        }
    }

    fn write_script(&self, name: &str, body: &str) {
        let dir = self.base.join("scripts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    fn coordinator(&self, scripts: &[(&str, &str)]) -> Coordinator {
        let manifest = Manifest {
            scripts: scripts
                .iter()
                .map(|(platform, path)| ScriptEntry {
                    platform: platform.to_string(),
                    path: path.to_string(),
                })
                .collect(),
        };
        Coordinator::new(
            Configuration::default(),
            manifest,
            ScriptInvoker::new(&self.base),
            self.store(),
        )
        .with_platform(Platform::Linux)
    }

    fn store(&self) -> StateStore {
        StateStore::in_dir(&self.base)
    }
}

fn request(environment: &str, force: bool) -> RehydrateRequest {
    RehydrateRequest {
        environment: Some(environment.to_string()),
        verify_integrity: None,
        force,
    }
}

const ECHO_ARGS: &str = "#!/usr/bin/env bash\necho \"args: $*\"\nexit 0\n";

#[tokio::test]
async fn test_successful_rehydration_updates_state() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    let result = coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.skipped);
    assert_eq!(result.message, "Rehydration completed");

    let record = result.record.unwrap();
    assert_eq!(record.status, RecordStatus::Success);
    assert_eq!(record.returncode, Some(0));
    assert_eq!(record.platform, Platform::Linux);
    let output = record.output.unwrap();
    assert!(output.contains("--environment=staging"));
    assert!(output.contains("--verify"), "verify defaults from configuration");

    assert_eq!(state.system_status, SystemStatus::Hydrated);
    assert!(state.active_environments.contains("staging"));
    assert!(state.last_rehydration.is_some());
    assert_eq!(state.rehydration_history.len(), 1);

    // Persisted before returning
    assert_eq!(fixture.store().load().unwrap(), state);
}

#[tokio::test]
async fn test_verify_flag_can_be_disabled() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    let result = coordinator
        .rehydrate(
            &mut state,
            RehydrateRequest {
                environment: Some("staging".to_string()),
                verify_integrity: Some(false),
                force: false,
            },
        )
        .await
        .unwrap();

    let record = result.record.unwrap();
    assert!(!record.verify_integrity);
    assert!(!record.output.unwrap().contains("--verify"));
}

#[tokio::test]
async fn test_already_hydrated_environment_is_skipped() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();
    let persisted = fixture.store().load().unwrap();

    let result = coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.skipped);
    assert_eq!(result.message, "Already hydrated");
    assert_eq!(state.rehydration_history.len(), 1);
    assert_eq!(fixture.store().load().unwrap(), persisted);
}

#[tokio::test]
async fn test_other_environment_is_not_skipped() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();
    let result = coordinator
        .rehydrate(&mut state, request("production", false))
        .await
        .unwrap();

    assert!(!result.skipped);
    let envs: Vec<&str> = state.active_environments.iter().map(String::as_str).collect();
    assert_eq!(envs, vec!["staging", "production"]);
}

#[tokio::test]
async fn test_force_always_invokes_script() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    for expected_len in 1..=3 {
        let result = coordinator
            .rehydrate(&mut state, request("staging", true))
            .await
            .unwrap();
        assert!(!result.skipped);
        assert_eq!(state.rehydration_history.len(), expected_len);
    }

    // Still a single active environment
    assert_eq!(state.active_environments.len(), 1);
}

#[tokio::test]
async fn test_failed_script_records_failure() {
    let fixture = Fixture::new();
    fixture.write_script(
        "rehydrate.sh",
        "#!/usr/bin/env bash\necho \"starting\"\necho \"disk full\" >&2\nexit 1\n",
    );
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    let result = coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "Rehydration failed");

    let record = result.record.unwrap();
    assert_eq!(record.status, RecordStatus::Failed);
    assert_eq!(record.returncode, Some(1));
    assert_eq!(record.output.as_deref(), Some("starting\n"));
    assert!(record.stderr.unwrap().contains("disk full"));

    assert_eq!(state.system_status, SystemStatus::Uninitialized);
    assert!(state.active_environments.is_empty());
    assert!(state.last_rehydration.is_none());
    assert_eq!(fixture.store().load().unwrap().rehydration_history.len(), 1);
}

#[tokio::test]
async fn test_failure_after_success_keeps_hydrated_status() {
    let fixture = Fixture::new();
    fixture.write_script("ok.sh", ECHO_ARGS);
    fixture.write_script("fail.sh", "#!/usr/bin/env bash\nexit 3\n");
    let mut state = GlobalState::default();

    fixture
        .coordinator(&[("linux", "scripts/ok.sh")])
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();
    let last = state.last_rehydration;

    let result = fixture
        .coordinator(&[("linux", "scripts/fail.sh")])
        .rehydrate(&mut state, request("production", false))
        .await
        .unwrap();

    assert_eq!(result.record.unwrap().returncode, Some(3));
    assert_eq!(state.system_status, SystemStatus::Hydrated);
    assert_eq!(state.last_rehydration, last);
    assert!(!state.active_environments.contains("production"));
}

#[tokio::test]
async fn test_missing_script_records_error() {
    let fixture = Fixture::new();
    let coordinator = fixture.coordinator(&[("linux", "scripts/missing.sh")]);
    let mut state = GlobalState::default();

    let result = coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.message.starts_with("Error: "));

    let record = result.record.unwrap();
    assert_eq!(record.status, RecordStatus::Error);
    assert!(record.error.unwrap().contains("not found"));
    assert!(record.returncode.is_none());

    assert!(state.active_environments.is_empty());
    assert_eq!(state.system_status, SystemStatus::Uninitialized);
    assert_eq!(fixture.store().load().unwrap().rehydration_history.len(), 1);
}

#[tokio::test]
async fn test_no_script_for_platform_is_configuration_error() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.ps1", "exit 0");
    let coordinator = fixture.coordinator(&[("windows", "scripts/rehydrate.ps1")]);
    let mut state = GlobalState::default();

    let err = coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CoordinatorError>(),
        Some(CoordinatorError::NoScriptForPlatform(Platform::Linux))
    ));
    assert!(state.rehydration_history.is_empty());
    assert!(!fixture.store().path().exists());
}

#[tokio::test]
async fn test_every_attempt_appends_exactly_one_terminal_record() {
    let fixture = Fixture::new();
    fixture.write_script("ok.sh", ECHO_ARGS);
    fixture.write_script("fail.sh", "#!/usr/bin/env bash\nexit 1\n");
    let mut state = GlobalState::default();

    let scripts = ["scripts/ok.sh", "scripts/fail.sh", "scripts/missing.sh"];
    for (i, script) in scripts.iter().enumerate() {
        let coordinator = fixture.coordinator(&[("linux", *script)]);
        coordinator
            .rehydrate(&mut state, request(&format!("env-{}", i), true))
            .await
            .unwrap();

        assert_eq!(state.rehydration_history.len(), i + 1);
        let last = state.rehydration_history.last().unwrap();
        assert!(last.status.is_terminal());
        assert_eq!(last.environment, format!("env-{}", i));
    }

    let statuses: Vec<RecordStatus> = state
        .rehydration_history
        .iter()
        .map(|r| r.status)
        .collect();
    assert_eq!(
        statuses,
        vec![RecordStatus::Success, RecordStatus::Failed, RecordStatus::Error]
    );
}

#[tokio::test]
async fn test_reset_then_status_is_uninitialized() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    coordinator
        .rehydrate(&mut state, request("staging", false))
        .await
        .unwrap();
    coordinator.reset(&mut state).unwrap();

    let status = coordinator.status(&state);
    assert_eq!(status.system_status, SystemStatus::Uninitialized);
    assert!(status.active_environments.is_empty());
    assert!(status.last_rehydration.is_none());
    assert_eq!(status.total_rehydrations, 0);

    assert_eq!(fixture.store().load().unwrap(), GlobalState::default());
}

#[tokio::test]
async fn test_history_returns_most_recent_window_in_order() {
    let fixture = Fixture::new();
    fixture.write_script("rehydrate.sh", ECHO_ARGS);
    let coordinator = fixture.coordinator(&[("linux", "scripts/rehydrate.sh")]);
    let mut state = GlobalState::default();

    for i in 1..=5 {
        coordinator
            .rehydrate(&mut state, request(&format!("env-{}", i), false))
            .await
            .unwrap();
    }

    let window: Vec<&str> = coordinator
        .history(&state, Some(2))
        .iter()
        .map(|r| r.environment.as_str())
        .collect();
    assert_eq!(window, vec!["env-4", "env-5"]);

    assert_eq!(coordinator.history(&state, None).len(), 5);
    assert_eq!(coordinator.history(&state, Some(0)).len(), 5);
}
