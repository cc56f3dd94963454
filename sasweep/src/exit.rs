//! Exit codes for the sasweep CLI.
//!
//! Failed clear commands do not change the exit code; they are reported in
//! the run summary.

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution, including runs below the thresholds.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: i32 = 1;
    /// A table scan failed and the sweep was aborted.
    pub const FETCH_FAILED: i32 = 3;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Sweep(_) => codes::FETCH_FAILED,
    }
}
