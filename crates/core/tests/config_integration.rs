//! Integration tests for `alarmpool_core::config`.
//!
//! Loads configuration files from disk and builds a running scheduler from
//! them.

use std::io::Write;
use std::sync::mpsc;
use std::time::Duration;

use alarmpool_common::assert_error_contains;
use alarmpool_core::config::{load_from_file, loader::probe_config_paths_in};
use alarmpool_core::{AlarmScheduler, LifecycleState, RuntimeConfig, ShutdownMode};
use tempfile::{Builder, TempDir};

#[test]
fn toml_file_builds_a_working_scheduler() -> anyhow::Result<()> {
    let mut file = Builder::new().prefix("alarmpool").suffix(".toml").tempfile()?;
    writeln!(
        file,
        r#"
[pool]
workers = 2
queue_capacity = 16
thread_name_prefix = "cfg-worker"

[scheduler]
shutdown_mode = "fire_pending"
drain_pool_on_shutdown = true
thread_name = "cfg-scheduler"
late_fire_warning_ms = 25
"#
    )?;

    let config = load_from_file(Some(file.path().to_path_buf()))?;
    assert_eq!(config.pool.workers, 2);
    assert_eq!(config.pool.queue_capacity, Some(16));
    assert_eq!(config.scheduler.shutdown_mode, ShutdownMode::FirePending);
    assert_eq!(config.scheduler.late_fire_warning, Duration::from_millis(25));

    let scheduler = AlarmScheduler::with_pool(config)?;
    assert_eq!(scheduler.pool().worker_count(), 2);

    let (tx, rx) = mpsc::channel();
    scheduler.register_after(Duration::from_secs(60), move || tx.send("flushed").unwrap())?;
    scheduler.shutdown();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5))?, "flushed");
    assert_eq!(scheduler.state(), LifecycleState::Stopped);
    Ok(())
}

#[test]
fn json_file_with_partial_sections_uses_defaults() -> anyhow::Result<()> {
    let mut file = Builder::new().suffix(".json").tempfile()?;
    write!(file, r#"{{"pool": {{"workers": 3}}}}"#)?;

    let config = load_from_file(Some(file.path().to_path_buf()))?;
    let expected = RuntimeConfig::default();
    assert_eq!(config.pool.workers, 3);
    assert_eq!(config.pool.queue_capacity, None);
    assert_eq!(config.scheduler, expected.scheduler);
    Ok(())
}

#[test]
fn invalid_files_are_config_errors() -> anyhow::Result<()> {
    let mut bad_toml = Builder::new().suffix(".toml").tempfile()?;
    writeln!(bad_toml, "[pool]\nworkers = \"four\"")?;
    assert_error_contains!(load_from_file(Some(bad_toml.path().to_path_buf())), "Invalid TOML format");

    let mut bad_mode = Builder::new().suffix(".toml").tempfile()?;
    writeln!(bad_mode, "[scheduler]\nshutdown_mode = \"flush\"")?;
    assert!(load_from_file(Some(bad_mode.path().to_path_buf())).is_err());

    let mut zero_capacity = Builder::new().suffix(".json").tempfile()?;
    write!(zero_capacity, r#"{{"pool": {{"workers": 1, "queue_capacity": 0}}}}"#)?;
    let err = load_from_file(Some(zero_capacity.path().to_path_buf())).unwrap_err();
    assert!(err.to_string().contains("queue_capacity"));
    Ok(())
}

#[test]
fn probed_file_loads() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("config.toml"), "[pool]\nworkers = 6\n")?;

    let found = probe_config_paths_in(dir.path()).expect("config.toml should be found");
    let config = load_from_file(Some(found))?;
    assert_eq!(config.pool.workers, 6);
    Ok(())
}
