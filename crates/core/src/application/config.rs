// Orchestrator configuration

use serde::Serialize;
use std::ops::Range;
use std::path::PathBuf;

use super::constants::*;
use crate::domain::{ContractCall, DerivedAddress, DEFAULT_SS58_FORMAT};
use crate::error::{AppError, Result};

/// Everything the driver needs to build a contract call for an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorConfig {
    /// Contract account to call
    pub contract: String,
    /// Message invoked on the contract
    pub message: String,
    /// Signer secret URI passed as `--suri`
    pub suri: String,
    /// Append `--skip-confirm`
    pub skip_confirm: bool,
    /// First index (inclusive)
    pub start: u32,
    /// Number of consecutive indices
    pub count: u32,
    /// SS58 network format for address encoding
    pub ss58_format: u16,
    /// Executable providing `contract call`
    pub program: String,
    pub working_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            contract: DEFAULT_CONTRACT.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            suri: DEFAULT_SURI.to_string(),
            skip_confirm: true,
            start: 0,
            count: DEFAULT_CALL_COUNT,
            ss58_format: DEFAULT_SS58_FORMAT,
            program: DEFAULT_PROGRAM.to_string(),
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
        }
    }
}

impl OrchestratorConfig {
    /// Reject configurations that cannot produce a single valid call
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("contract", &self.contract),
            ("message", &self.message),
            ("suri", &self.suri),
            ("program", &self.program),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", name)));
            }
        }

        if self.count == 0 {
            return Err(AppError::Config("count must be at least 1".to_string()));
        }
        if self.start.checked_add(self.count).is_none() {
            return Err(AppError::Config(format!(
                "index range {} + {} overflows u32",
                self.start, self.count
            )));
        }

        // Surfaces a bad network format before anything is spawned
        crate::domain::derive_address(self.start, self.ss58_format)?;
        Ok(())
    }

    /// Indices visited by a run, in order
    ///
    /// Assumes `validate()` passed.
    pub fn indices(&self) -> Range<u32> {
        self.start..self.start.saturating_add(self.count)
    }

    /// Build the call for an already derived address
    pub fn contract_call(&self, address: &DerivedAddress) -> ContractCall {
        ContractCall {
            program: self.program.clone(),
            contract: self.contract.clone(),
            message: self.message.clone(),
            address: address.ss58.clone(),
            suri: self.suri.clone(),
            skip_confirm: self.skip_confirm,
            working_dir: self.working_dir.clone(),
        }
    }
}
