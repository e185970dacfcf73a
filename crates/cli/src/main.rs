//! Candidate Flood CLI - floods a voting contract with `add_candidate` calls
//! One `cargo contract call` per derived address, strictly in sequence.

mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::{error, info};

use candidate_flood_core::application::constants::*;
use candidate_flood_core::application::{
    shutdown_channel, Orchestrator, OrchestratorConfig, OrchestratorError, RunHalted, RunReport,
};
use candidate_flood_core::domain::{derive_address, DEFAULT_SS58_FORMAT};
use candidate_flood_core::port::SystemTimeProvider;
use candidate_flood_infra_system::{OutputMode, SubprocessRunner, SubprocessRunnerConfig};

/// Exit status when a run is halted by a failed call
const EXIT_HALTED: u8 = 1;

/// Exit status when a run is stopped by Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "candidate-flood")]
#[command(about = "Flood a voting contract with add_candidate calls", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    call: CallArgs,
}

#[derive(Args, Clone)]
struct CallArgs {
    /// Contract account to call
    #[arg(long, env = "CANDIDATE_FLOOD_CONTRACT", default_value = DEFAULT_CONTRACT, global = true)]
    contract: String,

    /// Contract message to invoke
    #[arg(long, env = "CANDIDATE_FLOOD_MESSAGE", default_value = DEFAULT_MESSAGE, global = true)]
    message: String,

    /// Signer secret URI
    #[arg(long, env = "CANDIDATE_FLOOD_SURI", default_value = DEFAULT_SURI, global = true)]
    suri: String,

    /// Do not pass --skip-confirm
    #[arg(long, global = true)]
    no_skip_confirm: bool,

    /// First index (inclusive)
    #[arg(long, env = "CANDIDATE_FLOOD_START", default_value_t = 0, global = true)]
    start: u32,

    /// Number of consecutive indices
    #[arg(long, env = "CANDIDATE_FLOOD_COUNT", default_value_t = DEFAULT_CALL_COUNT, global = true)]
    count: u32,

    /// SS58 network format used to encode addresses
    #[arg(long, env = "CANDIDATE_FLOOD_SS58_FORMAT", default_value_t = DEFAULT_SS58_FORMAT, global = true)]
    ss58_format: u16,

    /// Working directory for every call (`~` is expanded)
    #[arg(long, env = "CANDIDATE_FLOOD_WORKDIR", default_value = DEFAULT_WORKING_DIR, global = true)]
    workdir: String,

    /// Executable providing `contract call`
    #[arg(long, env = "CANDIDATE_FLOOD_PROGRAM", default_value = DEFAULT_PROGRAM, global = true)]
    program: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every call in sequence (default)
    Run(RunArgs),

    /// Print every command without running anything
    Plan {
        /// Print the effective configuration and commands as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the address derived for one index
    Address {
        /// Loop index
        index: u32,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Kill a call that runs longer than this many seconds and halt
    #[arg(long, env = "CANDIDATE_FLOOD_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Show the output of each call
    #[arg(long)]
    show_output: bool,

    /// Pass only these environment variables to each call (comma-separated)
    #[arg(long, value_delimiter = ',')]
    env_allowlist: Option<Vec<String>>,

    /// Print the run report as JSON when done
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct NonZeroRow {
    index: u32,
    address: String,
    exit_code: String,
}

impl CallArgs {
    fn to_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            contract: self.contract.clone(),
            message: self.message.clone(),
            suri: self.suri.clone(),
            skip_confirm: !self.no_skip_confirm,
            start: self.start,
            count: self.count,
            ss58_format: self.ss58_format,
            program: self.program.clone(),
            working_dir: PathBuf::from(shellexpand::tilde(&self.workdir).into_owned()),
        }
    }
}

impl RunArgs {
    fn to_runner_config(&self) -> SubprocessRunnerConfig {
        SubprocessRunnerConfig {
            output: if self.show_output {
                OutputMode::Inherit
            } else {
                OutputMode::Discard
            },
            env_allowlist: self.env_allowlist.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

fn print_summary(report: &RunReport) {
    let rows: Vec<NonZeroRow> = report
        .non_zero_exits()
        .map(|o| NonZeroRow {
            index: o.index,
            address: o.address.clone(),
            exit_code: exit_code_label(o.exit_code),
        })
        .collect();

    println!();
    println!("  {} {}", "Completed calls:".bold(), report.completed());
    println!("  {} {}", "Non-zero exits:".bold(), rows.len());

    if !rows.is_empty() {
        println!();
        println!("{}", Table::new(rows));
    }
}

fn build_orchestrator(call: &CallArgs, run: &RunArgs) -> Result<Orchestrator> {
    let runner = Arc::new(SubprocessRunner::new(
        Arc::new(SystemTimeProvider),
        run.to_runner_config(),
    ));
    Orchestrator::new(call.to_config(), runner).context("Invalid configuration")
}

/// Process exit status for a finished run
///
/// Non-zero child exits still count as a completed run. Configuration errors
/// never reach here: `main` returns them as `Err`, which exits 1.
fn exit_status_for(result: &std::result::Result<RunReport, RunHalted>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(RunHalted {
            cause: OrchestratorError::Interrupted { .. },
            ..
        }) => EXIT_INTERRUPTED,
        Err(_) => EXIT_HALTED,
    }
}

async fn run(call: &CallArgs, args: &RunArgs) -> Result<ExitCode> {
    let orchestrator = build_orchestrator(call, args)?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, finishing current call...");
            shutdown_tx.shutdown();
        }
    });

    let result = orchestrator.run(shutdown_rx).await;
    let status = exit_status_for(&result);

    let report = match result {
        Ok(report) => {
            println!("{}", "✓ Run completed".green().bold());
            report
        }
        Err(RunHalted { report, cause }) => {
            error!(error = %cause, "Run halted");
            if status == EXIT_INTERRUPTED {
                println!("{}", format!("○ {}", cause).yellow().bold());
            } else {
                println!("{}", format!("✗ {}", cause).red().bold());
            }
            report
        }
    };

    print_summary(&report);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ExitCode::from(status))
}

/// Effective configuration plus every planned command
fn plan_json(orchestrator: &Orchestrator) -> Result<serde_json::Value> {
    let calls = orchestrator
        .plan()?
        .into_iter()
        .map(|(index, call)| {
            serde_json::json!({
                "index": index,
                "address": call.address,
                "command": call.to_string(),
            })
        })
        .collect::<Vec<_>>();

    let config =
        serde_json::to_value(orchestrator.config()).context("Failed to serialize configuration")?;
    Ok(serde_json::json!({ "config": config, "calls": calls }))
}

fn plan(call: &CallArgs, json: bool) -> Result<()> {
    let orchestrator = build_orchestrator(call, &RunArgs::default())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&orchestrator)?)?);
        return Ok(());
    }
    let working_dir = orchestrator.config().working_dir.display().to_string();

    println!(
        "{}",
        format!("Planned calls (working dir: {})", working_dir)
            .cyan()
            .bold()
    );
    for (index, command) in orchestrator.plan()? {
        println!("{:>5}  {}", index, command);
    }
    Ok(())
}

fn address(call: &CallArgs, index: u32) -> Result<()> {
    let address = derive_address(index, call.ss58_format)
        .with_context(|| format!("Cannot derive address for index {}", index))?;

    println!("  {} {}", "Payload:".bold(), address.hex_payload);
    println!("  {} {}", "Address:".bold(), address.ss58);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging()?;

    info!(
        "Candidate flood v{} starting...",
        candidate_flood_core::VERSION
    );

    match cli.command {
        None => run(&cli.call, &RunArgs::default()).await,
        Some(Commands::Run(args)) => run(&cli.call, &args).await,
        Some(Commands::Plan { json }) => plan(&cli.call, json).map(|_| ExitCode::SUCCESS),
        Some(Commands::Address { index }) => {
            address(&cli.call, index).map(|_| ExitCode::SUCCESS)
        }
    }
}
