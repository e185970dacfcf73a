//! End-to-end runs of the orchestrator against real child processes
//!
//! `sh` stands in for `cargo`: it runs a script named `contract` from the
//! working directory, which records each call in a log file so the tests can
//! check ordering and overlap. Under `sh contract call ...` the `--args`
//! value lands in `$7`.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use candidate_flood_core::application::{
    Orchestrator, OrchestratorConfig, OrchestratorError, ShutdownToken,
};
use candidate_flood_core::domain::{derive_address, DEFAULT_SS58_FORMAT};
use candidate_flood_core::port::SystemTimeProvider;
use candidate_flood_infra_system::{SubprocessRunner, SubprocessRunnerConfig};

/// Fresh scratch directory per test, with a `work/` subdirectory for the calls
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "candidate-flood-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("work")).unwrap();
    dir
}

fn address(index: u32) -> String {
    derive_address(index, DEFAULT_SS58_FORMAT).unwrap().ss58
}

/// Write the `contract` script run by `sh`; `body` runs between the log lines
fn fake_contract(dir: &Path, body: &str) {
    let text = format!(
        "LOG='{}'\necho \"start $7 $(pwd)\" >> \"$LOG\"\n{}\necho \"end $7\" >> \"$LOG\"\nexit 0\n",
        dir.join("calls.log").display(),
        body
    );
    std::fs::write(dir.join("work").join("contract"), text).unwrap();
}

fn read_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

fn orchestrator(
    dir: &Path,
    program: &str,
    count: u32,
    runner_config: SubprocessRunnerConfig,
) -> Orchestrator {
    let config = OrchestratorConfig {
        count,
        program: program.to_string(),
        working_dir: dir.join("work"),
        ..Default::default()
    };
    let runner = Arc::new(SubprocessRunner::new(
        Arc::new(SystemTimeProvider),
        runner_config,
    ));
    Orchestrator::new(config, runner).unwrap()
}

#[tokio::test]
async fn test_calls_run_in_order_one_at_a_time() {
    let dir = scratch_dir("ordered");
    fake_contract(&dir, "sleep 0.05");
    let orchestrator = orchestrator(&dir, "sh", 5, SubprocessRunnerConfig::default());

    let report = orchestrator.run(ShutdownToken::never()).await.unwrap();

    assert_eq!(report.completed(), 5);
    assert!(report.outcomes.iter().all(|o| o.exit_code == Some(0)));

    let log = read_log(&dir);
    assert_eq!(log.len(), 10);
    let canonical_dir = std::fs::canonicalize(dir.join("work")).unwrap();
    for (i, pair) in log.chunks(2).enumerate() {
        let expected = address(i as u32);
        let start: Vec<&str> = pair[0].split(' ').collect();
        assert_eq!(start[0], "start");
        assert_eq!(start[1], expected);
        assert_eq!(std::fs::canonicalize(start[2]).unwrap(), canonical_dir);
        assert_eq!(pair[1], format!("end {}", expected));
    }
}

#[tokio::test]
async fn test_non_zero_exit_does_not_stop_run() {
    let dir = scratch_dir("nonzero");
    let failing = address(2);
    fake_contract(
        &dir,
        &format!("if [ \"$7\" = \"{}\" ]; then exit 3; fi", failing),
    );
    let orchestrator = orchestrator(&dir, "sh", 4, SubprocessRunnerConfig::default());

    let report = orchestrator.run(ShutdownToken::never()).await.unwrap();

    assert_eq!(report.completed(), 4);
    assert_eq!(report.outcomes[2].exit_code, Some(3));
    let non_zero: Vec<u32> = report.non_zero_exits().map(|o| o.index).collect();
    assert_eq!(non_zero, vec![2]);
}

#[tokio::test]
async fn test_missing_program_halts_before_any_call() {
    let dir = scratch_dir("missing");
    let program = dir.join("no-such-cargo").display().to_string();
    let orchestrator = orchestrator(&dir, &program, 3, SubprocessRunnerConfig::default());

    let halted = orchestrator.run(ShutdownToken::never()).await.unwrap_err();

    assert_eq!(halted.report.completed(), 0);
    assert!(matches!(
        halted.cause,
        OrchestratorError::SpawnFailed { index: 0, .. }
    ));
}

#[tokio::test]
async fn test_spawn_failure_mid_run_stops_later_indices() {
    let dir = scratch_dir("midrun");
    // The second call deletes the working directory, so the third cannot start
    fake_contract(
        &dir,
        &format!("if [ \"$7\" = \"{}\" ]; then rm -rf \"$PWD\"; fi", address(1)),
    );
    let orchestrator = orchestrator(&dir, "sh", 5, SubprocessRunnerConfig::default());

    let halted = orchestrator.run(ShutdownToken::never()).await.unwrap_err();

    assert_eq!(halted.report.completed(), 2);
    assert!(matches!(
        halted.cause,
        OrchestratorError::SpawnFailed { index: 2, .. }
    ));
    assert_eq!(read_log(&dir).len(), 4);
}

#[tokio::test]
async fn test_timeout_kills_call_and_halts() {
    let dir = scratch_dir("timeout");
    fake_contract(&dir, "exec sleep 10");
    let orchestrator = orchestrator(
        &dir,
        "sh",
        3,
        SubprocessRunnerConfig {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        },
    );

    let started = std::time::Instant::now();
    let halted = orchestrator.run(ShutdownToken::never()).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        halted.cause,
        OrchestratorError::Timeout {
            index: 0,
            timeout_ms: 200
        }
    );
    assert_eq!(read_log(&dir).len(), 1);
}
