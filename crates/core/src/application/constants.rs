// Driver defaults (no magic values)

/// Voting contract instance targeted by the demo
pub const DEFAULT_CONTRACT: &str = "5FHKCqCpykVpaceaJaLi2fqCeDcCjpqMXRtG3a8wy1hRXYCa";

/// Message that registers one candidate per call
pub const DEFAULT_MESSAGE: &str = "add_candidate";

/// Development signer
pub const DEFAULT_SURI: &str = "//Alice";

/// Executable that provides the `contract` subcommand
pub const DEFAULT_PROGRAM: &str = "cargo";

/// Working directory for every call, relative to where the driver starts
pub const DEFAULT_WORKING_DIR: &str = "..";

/// Number of candidates added per run
pub const DEFAULT_CALL_COUNT: u32 = 512;
