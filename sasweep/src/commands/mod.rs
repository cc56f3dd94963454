//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `run` - Sweep the local device
//! - `replay` - Sweep captured replies, writing clear statements to a file

pub mod replay;
pub mod run;
pub mod sweep;

pub use replay::{execute_replay, ReplayResult};
pub use run::{cli_device, execute_run};
pub use sweep::{execute_sweep, notifier_for, SweepResult};

use crate::cli::CliError;
use crate::sweep::SweepError;
use thiserror::Error;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("sweep failed: {0}")]
    Sweep(#[from] SweepError),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
