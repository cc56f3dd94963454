//! Run command orchestration.
//!
//! Sweeps the local device through the Junos operational CLI.

use std::time::Duration;

use sasweep_device::{CliDevice, Device};
use sasweep_fs::Filesystem;

use crate::cli::RunArgs;
use crate::clock::Clock;
use crate::logger::Logger;
use crate::notifier::Notifier;
use crate::sleeper::Sleeper;

use super::sweep::{execute_sweep, SweepResult};
use super::CommandResult;

/// Device for the run command.
pub fn cli_device(args: &RunArgs) -> CliDevice {
    CliDevice::with_program(args.cli_program.clone(), Vec::new())
        .with_command_timeout(Duration::from_secs(args.command_timeout_sec))
}

/// Execute the run command against `device`.
pub fn execute_run<D, S, L, N, F, C>(
    args: &RunArgs,
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
    args.validate()?;
    execute_sweep(&args.sweep, device, sleeper, logger, notifier, fs, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{parse_from, CliError, Command};
    use crate::clock::MockClock;
    use crate::logger::MockLogger;
    use crate::notifier::MockNotifier;
    use crate::sleeper::MockSleeper;
    use crate::CommandError;
    use sasweep_device::MockDevice;
    use sasweep_fs::MockFilesystem;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["sasweep", "run"];
        argv.extend_from_slice(extra);
        match parse_from(argv).expect("parse").command {
            Command::Run(args) => args,
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn test_execute_run_invalid_args_touch_nothing() {
        let args = run_args(&["--top-talkers", "0"]);
        let device = MockDevice::new();
        let notifier = MockNotifier::new();

        let result = execute_run(
            &args,
            &device,
            &MockSleeper::new(),
            &MockLogger::new(),
            &notifier,
            &MockFilesystem::new(),
            &MockClock::from_unix_sec(0).expect("valid"),
        );

        assert!(matches!(
            result,
            Err(CommandError::InvalidArgument(CliError::InvalidTopTalkers(0)))
        ));
        assert!(device.calls().is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_execute_run_live() {
        let args = run_args(&[
            "--execute",
            "--min-total-sessions",
            "10",
            "--min-peer-sessions",
            "5",
            "--settle-ms",
            "250",
        ]);
        let mut device = MockDevice::new();
        device.add_sessions("198.51.100.7", 10);
        device.add_association("198.51.100.7", "500");
        let sleeper = MockSleeper::new();

        let result = execute_run(
            &args,
            &device,
            &sleeper,
            &MockLogger::new(),
            &MockNotifier::new(),
            &MockFilesystem::new(),
            &MockClock::from_unix_sec(0).expect("valid"),
        )
        .expect("run");

        assert_eq!(result.summary.commands_succeeded, 2);
        assert_eq!(sleeper.pauses(), vec![Duration::from_millis(250)]);
    }

    #[test]
    fn test_cli_device_from_args() {
        let args = run_args(&["--cli-program", "/usr/sbin/cli", "--command-timeout-sec", "5"]);
        let device = cli_device(&args);
        let debug = format!("{:?}", device);
        assert!(debug.contains("/usr/sbin/cli"));
        assert!(debug.contains("5s"));
    }
}
