// Subprocess runner implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use candidate_flood_core::domain::ContractCall;
use candidate_flood_core::port::{CommandRunner, ExitStatus, RunnerError, TimeProvider};

/// Grace period between SIGTERM and SIGKILL for a timed-out call (5 seconds)
pub const GRACEFUL_TERMINATION_TIMEOUT: Duration = Duration::from_secs(5);

/// What happens to the child's stdout/stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Drop everything the child writes
    #[default]
    Discard,
    /// Share the driver's stdout/stderr
    Inherit,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Discard => Stdio::null(),
            OutputMode::Inherit => Stdio::inherit(),
        }
    }
}

/// Runner settings
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunnerConfig {
    pub output: OutputMode,
    /// When set, the child sees only these variables from the driver's environment
    pub env_allowlist: Option<Vec<String>>,
    /// Per-call deadline; `None` waits forever
    pub timeout: Option<Duration>,
}

/// Spawns one child process per call and reaps it before returning
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
    config: SubprocessRunnerConfig,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(
    ///     Arc::new(SystemTimeProvider),
    ///     SubprocessRunnerConfig::default(),
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, config: SubprocessRunnerConfig) -> Self {
        Self {
            time_provider,
            config,
        }
    }

    /// Filter environment variables to the allowlist
    ///
    /// Works on `OsString` pairs so non-UTF-8 variables elsewhere in the
    /// environment are skipped rather than fatal.
    fn filter_env(
        &self,
        allowlist: &[String],
        env: impl Iterator<Item = (OsString, OsString)>,
    ) -> HashMap<OsString, OsString> {
        env.filter(|(k, _)| {
            allowlist
                .iter()
                .any(|allowed| k.as_os_str() == allowed.as_str())
        })
        .collect()
    }

    fn build_command(&self, call: &ContractCall) -> Command {
        let mut command = Command::new(&call.program);
        command
            .args(call.args())
            .current_dir(&call.working_dir)
            .stdin(Stdio::null())
            .stdout(self.config.output.stdio())
            .stderr(self.config.output.stdio())
            .kill_on_drop(true);

        if let Some(allowlist) = &self.config.env_allowlist {
            command
                .env_clear()
                .envs(self.filter_env(allowlist, std::env::vars_os()));
        }

        command
    }

    /// Wait for the child, honoring the configured deadline
    async fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus, RunnerError> {
        let Some(limit) = self.config.timeout else {
            return child
                .wait()
                .await
                .map_err(|e| RunnerError::IoError(e.to_string()));
        };

        match timeout(limit, child.wait()).await {
            Ok(result) => result.map_err(|e| RunnerError::IoError(e.to_string())),
            Err(_) => {
                let timeout_ms = limit.as_millis() as u64;
                warn!(timeout_ms, "Subprocess timed out, terminating");
                self.terminate(child).await;
                Err(RunnerError::Timeout(timeout_ms))
            }
        }
    }

    /// SIGTERM first, then SIGKILL once the grace period runs out
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(GRACEFUL_TERMINATION_TIMEOUT, child.wait())
                        .await
                        .is_ok()
                {
                    info!(pid = %pid, "Process exited gracefully after SIGTERM");
                    return;
                }
                warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
            }
        }

        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill subprocess");
        }
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, call: &ContractCall) -> Result<ExitStatus, RunnerError> {
        let start_time = self.time_provider.now_millis();

        debug!(
            command = %call,
            working_dir = %call.working_dir.display(),
            timeout = ?self.config.timeout,
            "Starting subprocess"
        );

        let mut child = self
            .build_command(call)
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed(e.to_string()))?;

        let status = self.wait(&mut child).await?;
        let duration_ms = self.time_provider.now_millis() - start_time;

        debug!(
            exit_code = ?status.code(),
            duration_ms = %duration_ms,
            "Subprocess completed"
        );

        Ok(ExitStatus {
            code: status.code(),
            duration_ms,
        })
    }
}
