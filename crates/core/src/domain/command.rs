// Contract call command line

use std::path::PathBuf;

/// One `cargo contract call` invocation
///
/// Spawned directly from `program` + `args()`, never through a shell,
/// so the address never needs quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub program: String,
    pub contract: String,
    pub message: String,
    pub address: String,
    pub suri: String,
    pub skip_confirm: bool,
    pub working_dir: PathBuf,
}

impl ContractCall {
    /// Argument vector passed to `program`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "contract".to_string(),
            "call".to_string(),
            "--contract".to_string(),
            self.contract.clone(),
            "--message".to_string(),
            self.message.clone(),
            "--args".to_string(),
            self.address.clone(),
            "--suri".to_string(),
            self.suri.clone(),
        ];
        if self.skip_confirm {
            args.push("--skip-confirm".to_string());
        }
        args
    }
}

impl std::fmt::Display for ContractCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(skip_confirm: bool) -> ContractCall {
        ContractCall {
            program: "cargo".to_string(),
            contract: "5FHKCqCpykVpaceaJaLi2fqCeDcCjpqMXRtG3a8wy1hRXYCa".to_string(),
            message: "add_candidate".to_string(),
            address: "5C4hrfjw9DjXZTzV3MwzrrAr9P1MJhSrvWGWqi1eSuyUpnhM".to_string(),
            suri: "//Alice".to_string(),
            skip_confirm,
            working_dir: PathBuf::from(".."),
        }
    }

    #[test]
    fn test_command_line_matches_cargo_contract_form() {
        assert_eq!(
            sample(true).to_string(),
            "cargo contract call --contract 5FHKCqCpykVpaceaJaLi2fqCeDcCjpqMXRtG3a8wy1hRXYCa \
             --message add_candidate --args 5C4hrfjw9DjXZTzV3MwzrrAr9P1MJhSrvWGWqi1eSuyUpnhM \
             --suri //Alice --skip-confirm"
        );
    }

    #[test]
    fn test_skip_confirm_optional() {
        let args = sample(false).args();
        assert!(!args.contains(&"--skip-confirm".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("//Alice"));
    }
}
