//! Replay command orchestration.
//!
//! Sweeps captured `| display json` replies instead of a live device. The
//! clear statements a live run would send are appended to a command file.

use std::path::PathBuf;

use sasweep_device::ReplayDevice;
use sasweep_fs::Filesystem;

use crate::cli::ReplayArgs;
use crate::clock::Clock;
use crate::logger::Logger;
use crate::notifier::Notifier;
use crate::sleeper::Sleeper;

use super::sweep::{execute_sweep, SweepResult};
use super::CommandResult;

/// Result of replay command execution.
#[derive(Debug)]
pub struct ReplayResult {
    pub sweep: SweepResult,
    /// File receiving the clear statements.
    pub commands_path: PathBuf,
}

/// Execute the replay command.
pub fn execute_replay<F, S, L, N, C>(
    args: &ReplayArgs,
    fs: &F,
    sleeper: &S,
    logger: &L,
    notifier: &N,
    clock: &C,
) -> CommandResult<ReplayResult>
where
    F: Filesystem,
    S: Sleeper + ?Sized,
    L: Logger + ?Sized,
    N: Notifier + ?Sized,
    C: Clock,
{
    args.validate()?;

    let device = ReplayDevice::new(
        fs,
        args.sessions.clone(),
        args.associations.clone(),
        args.commands_out.clone(),
    );
    let sweep = execute_sweep(&args.sweep, &device, sleeper, logger, notifier, fs, clock)?;

    Ok(ReplayResult {
        sweep,
        commands_path: device.commands_path().to_path_buf(),
    })
}
