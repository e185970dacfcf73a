// Orchestrator - sequential contract call loop

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::config::OrchestratorConfig;
use super::shutdown::ShutdownToken;
use crate::domain::{derive_address, ContractCall, DomainError};
use crate::error::Result;
use crate::port::{CommandRunner, RunnerError};

/// Outcome of one completed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationOutcome {
    pub index: u32,
    pub address: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
}

impl IterationOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Every completed call of a run, in index order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<IterationOutcome>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    /// Calls that exited with anything other than code 0
    pub fn non_zero_exits(&self) -> impl Iterator<Item = &IterationOutcome> {
        self.outcomes.iter().filter(|o| !o.success())
    }
}

/// Reasons a run stops before visiting every index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Address derivation failed at index {index}: {source}")]
    Address {
        index: u32,
        #[source]
        source: DomainError,
    },

    #[error("Failed to start subprocess at index {index}: {reason}")]
    SpawnFailed { index: u32, reason: String },

    #[error("Subprocess at index {index} timed out after {timeout_ms}ms")]
    Timeout { index: u32, timeout_ms: u64 },

    #[error("Waiting on subprocess at index {index} failed: {reason}")]
    Io { index: u32, reason: String },

    #[error("Run interrupted before index {next_index}")]
    Interrupted { next_index: u32 },
}

impl OrchestratorError {
    fn from_runner(index: u32, err: RunnerError) -> Self {
        match err {
            RunnerError::SpawnFailed(reason) => Self::SpawnFailed { index, reason },
            RunnerError::Timeout(timeout_ms) => Self::Timeout { index, timeout_ms },
            RunnerError::IoError(reason) => Self::Io { index, reason },
        }
    }
}

/// A run that stopped early, with everything completed before the stop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Run halted: {cause}")]
pub struct RunHalted {
    pub report: RunReport,
    #[source]
    pub cause: OrchestratorError,
}

/// Drives one contract call per index, strictly one at a time
pub struct Orchestrator {
    config: OrchestratorConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Orchestrator {
    /// Create an orchestrator; fails on invalid configuration
    pub fn new(config: OrchestratorConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Build the call for `index`
    pub fn call_for(&self, index: u32) -> std::result::Result<ContractCall, OrchestratorError> {
        let address = derive_address(index, self.config.ss58_format)
            .map_err(|source| OrchestratorError::Address { index, source })?;
        Ok(self.config.contract_call(&address))
    }

    /// Every call a run would make, without executing any of them
    pub fn plan(&self) -> std::result::Result<Vec<(u32, ContractCall)>, OrchestratorError> {
        self.config
            .indices()
            .map(|index| self.call_for(index).map(|call| (index, call)))
            .collect()
    }

    /// Run a single index to completion
    ///
    /// Non-zero exits are returned as outcomes; only failures to run are errors.
    pub async fn run_once(
        &self,
        index: u32,
    ) -> std::result::Result<IterationOutcome, OrchestratorError> {
        let call = self.call_for(index)?;

        match self.runner.run(&call).await {
            Ok(status) => {
                if status.success() {
                    info!(
                        index,
                        address = %call.address,
                        exit_code = ?status.code,
                        "{} child process exited with code 0",
                        index
                    );
                } else {
                    warn!(
                        index,
                        address = %call.address,
                        exit_code = ?status.code,
                        "{} child process exited with code {:?}",
                        index,
                        status.code
                    );
                }
                Ok(IterationOutcome {
                    index,
                    address: call.address,
                    exit_code: status.code,
                    duration_ms: status.duration_ms,
                })
            }
            Err(e) => {
                error!(index, command = %call, error = %e, "Contract call failed");
                Err(OrchestratorError::from_runner(index, e))
            }
        }
    }

    /// Visit every configured index in increasing order
    ///
    /// Each call is awaited before the next begins. The run halts on the first
    /// failure to run a call, or when `shutdown` fires. A shutdown that arrives
    /// mid-call still waits for that call, then no further index starts.
    pub async fn run(
        &self,
        mut shutdown: ShutdownToken,
    ) -> std::result::Result<RunReport, RunHalted> {
        let mut report = RunReport::default();

        info!(
            start = self.config.start,
            count = self.config.count,
            contract = %self.config.contract,
            message = %self.config.message,
            "Starting contract call run"
        );

        for index in self.config.indices() {
            // Let a pending Ctrl-C handler record the stop before the next spawn
            tokio::task::yield_now().await;
            if shutdown.is_shutdown() {
                warn!(next_index = index, "Shutdown requested, stopping run");
                return Err(RunHalted {
                    report,
                    cause: OrchestratorError::Interrupted { next_index: index },
                });
            }

            let call = self.run_once(index);
            tokio::pin!(call);
            let result = tokio::select! {
                biased;
                result = &mut call => result,
                _ = shutdown.wait() => {
                    warn!(index, "Shutdown requested, waiting for in-flight call");
                    call.await
                }
            };

            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(cause) => return Err(RunHalted { report, cause }),
            }
        }

        info!(
            completed = report.completed(),
            non_zero = report.non_zero_exits().count(),
            "Contract call run finished"
        );
        Ok(report)
    }
}
