//! sasweep CLI binary.
//!
//! Entry point for the `sasweep` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use sasweep::exit::{codes, exit_code};
use sasweep::{
    cli_device, execute_replay, execute_run, notifier_for, Cli, Command, CommandError,
    RealSleeper, ReplayArgs, RunArgs, StderrLogger, SweepResult, SystemClock,
};
use sasweep_fs::RealFilesystem;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run_run(args),
        Command::Replay(args) => run_replay(args),
    };

    match result {
        Ok(()) => ExitCode::from(codes::SUCCESS as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

/// Run the run command.
fn run_run(args: RunArgs) -> Result<(), CommandError> {
    let logger = StderrLogger::from_debug_level(args.sweep.debug_level);
    let notifier = notifier_for(&args.sweep, &logger);
    let device = cli_device(&args);

    let result = execute_run(
        &args,
        &device,
        &RealSleeper,
        &logger,
        &notifier,
        &RealFilesystem,
        &SystemClock,
    )?;

    print_summary(&result);
    Ok(())
}

/// Run the replay command.
fn run_replay(args: ReplayArgs) -> Result<(), CommandError> {
    let logger = StderrLogger::from_debug_level(args.sweep.debug_level);
    let notifier = notifier_for(&args.sweep, &logger);

    let result = execute_replay(
        &args,
        &RealFilesystem,
        &RealSleeper,
        &logger,
        &notifier,
        &SystemClock,
    )?;

    print_summary(&result.sweep);
    if result.sweep.summary.commands_attempted > 0 {
        println!("  Statements written to: {}", result.commands_path.display());
    }
    Ok(())
}

fn print_summary(result: &SweepResult) {
    let summary = &result.summary;
    if !summary.attempted {
        println!(
            "Nothing to do: {} sessions in flow table",
            summary.total_sessions
        );
    } else {
        println!(
            "{} {} of {} suspicious peers ({} unique):",
            if summary.dry_run { "Would clear" } else { "Cleared" },
            summary.selected.len(),
            summary.suspicious_peers,
            summary.unique_peers
        );
        for peer in &summary.selected {
            println!("  {} ({} sessions)", peer.address, peer.sessions);
        }
        if summary.dry_run {
            println!("  Commands: {} (dry run)", summary.commands_simulated);
        } else {
            println!(
                "  Commands: {} attempted, {} succeeded, {} failed",
                summary.commands_attempted, summary.commands_succeeded, summary.commands_failed
            );
        }
    }
    if let Some(path) = &result.summary_path {
        println!("  Summary: {}", path.display());
    }
}
