//! Sweep orchestration shared by the run and replay commands.

use std::path::PathBuf;

use sasweep_device::Device;
use sasweep_fs::Filesystem;

use crate::cli::SweepArgs;
use crate::clock::Clock;
use crate::logger::Logger;
use crate::notifier::{Notifier, NullNotifier, SyslogNotifier};
use crate::sleeper::Sleeper;
use crate::summary::{RunSummary, SummaryWriter};
use crate::sweep::{run_sweep, RunOutcome};

use super::CommandResult;

/// Result of a sweep command.
#[derive(Debug)]
pub struct SweepResult {
    pub outcome: RunOutcome,
    pub summary: RunSummary,
    /// Where the summary was appended; `None` when disabled or the append failed.
    pub summary_path: Option<PathBuf>,
}

/// Run one sweep with validated arguments and journal its summary.
///
/// A journal append failure is logged and leaves `summary_path` unset; the
/// clears have already been issued by then.
pub fn execute_sweep<D, S, L, N, F, C>(
    args: &SweepArgs,
    device: &D,
    sleeper: &S,
    logger: &L,
    notifier: &N,
    fs: &F,
    clock: &C,
) -> CommandResult<SweepResult>
where
    D: Device + ?Sized,
    S: Sleeper + ?Sized,
    L: Logger + ?Sized,
    N: Notifier + ?Sized,
    F: Filesystem,
    C: Clock,
{
    let config = args.to_config();
    let outcome = run_sweep(&config, device, sleeper, logger, notifier)?;
    let summary = RunSummary::new(&config, &outcome, clock.now());

    let summary_path = match &args.summary_file {
        Some(path) => match SummaryWriter::new(fs, path.clone()).append(&summary) {
            Ok(()) => {
                logger.debug(&format!("Run summary appended to {}", path.display()));
                Some(path.clone())
            }
            Err(e) => {
                logger.error(&format!("{}", e));
                None
            }
        },
        None => None,
    };

    Ok(SweepResult {
        outcome,
        summary,
        summary_path,
    })
}

/// Notification channel for `args`.
///
/// An unusable syslog target is logged and notifications are dropped; it
/// never stops a sweep.
pub fn notifier_for<L: Logger + ?Sized>(args: &SweepArgs, logger: &L) -> Box<dyn Notifier> {
    if args.no_syslog {
        return Box::new(NullNotifier);
    }
    match SyslogNotifier::new(&args.syslog) {
        Ok(notifier) => Box::new(notifier),
        Err(e) => {
            logger.error(&format!("syslog disabled: {}", e));
            Box::new(NullNotifier)
        }
    }
}
