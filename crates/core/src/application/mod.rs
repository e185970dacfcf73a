// Application Layer - The driver loop and its configuration

pub mod config;
pub mod constants;
pub mod orchestrator;
pub mod shutdown;

// Re-exports
pub use config::OrchestratorConfig;
pub use orchestrator::{IterationOutcome, Orchestrator, OrchestratorError, RunHalted, RunReport};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
