// Command Runner Port
// Abstraction for executing one contract call as an external process

use crate::domain::ContractCall;
use async_trait::async_trait;
use thiserror::Error;

/// How a started process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub duration_ms: i64,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runner errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns the external process (infra-system)
/// - MockCommandRunner: scripted outcomes for tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `call` to completion and report how it exited
    ///
    /// A non-zero exit is `Ok`, not an error.
    ///
    /// # Errors
    /// - RunnerError::SpawnFailed if the process cannot be started
    /// - RunnerError::Timeout if a configured deadline expires
    /// - RunnerError::IoError if waiting on the process fails
    async fn run(&self, call: &ContractCall) -> Result<ExitStatus, RunnerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock runner behavior for one call
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit with the given code
        Exit(i32),
        /// Terminated by a signal (no exit code)
        Signalled,
        /// Fail to start
        SpawnFail(String),
        /// Deadline expired
        Timeout(u64),
    }

    /// Mock Command Runner for testing
    ///
    /// Behaviors are keyed by call number (0-based); unscripted calls use the default.
    pub struct MockCommandRunner {
        default: MockBehavior,
        script: HashMap<usize, MockBehavior>,
        calls: Mutex<Vec<ContractCall>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockCommandRunner {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                script: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Exit(0))
        }

        /// Override the behavior of call number `call`
        pub fn with(mut self, call: usize, behavior: MockBehavior) -> Self {
            self.script.insert(call, behavior);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<ContractCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Highest number of calls observed running at once
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(&self, call: &ContractCall) -> Result<ExitStatus, RunnerError> {
            let call_number = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(call.clone());
                calls.len() - 1
            };

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            // Give any overlapping caller a chance to run
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let behavior = self
                .script
                .get(&call_number)
                .cloned()
                .unwrap_or_else(|| self.default.clone());

            match behavior {
                MockBehavior::Exit(code) => Ok(ExitStatus {
                    code: Some(code),
                    duration_ms: 1,
                }),
                MockBehavior::Signalled => Ok(ExitStatus {
                    code: None,
                    duration_ms: 1,
                }),
                MockBehavior::SpawnFail(msg) => Err(RunnerError::SpawnFailed(msg)),
                MockBehavior::Timeout(ms) => Err(RunnerError::Timeout(ms)),
            }
        }
    }
}
