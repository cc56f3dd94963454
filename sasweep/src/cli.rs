//! CLI argument parsing for sasweep.
//!
//! `run` sweeps the local device through the Junos `cli`; `replay` sweeps
//! captured command output and writes the clear statements to a file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sasweep_device::cli_device::{DEFAULT_CLI_PROGRAM, DEFAULT_COMMAND_TIMEOUT};
use thiserror::Error;

use crate::config::{
    SweepConfig, Thresholds, DEFAULT_DEBUG_LEVEL, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MIN_PEER_SESSIONS, DEFAULT_MIN_TOTAL_SESSIONS, DEFAULT_PROTOCOL, DEFAULT_SETTLE_DELAY,
    DEFAULT_TOP_TALKERS,
};
use crate::notifier::DEFAULT_SYSLOG_TARGET;

/// Default flow-session scan timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SEC: u64 = DEFAULT_FETCH_TIMEOUT.as_secs();

/// Default settle pause in milliseconds.
pub const DEFAULT_SETTLE_MS: u64 = DEFAULT_SETTLE_DELAY.as_millis() as u64;

/// Default timeout for the other device commands in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SEC: u64 = DEFAULT_COMMAND_TIMEOUT.as_secs();

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("protocol must be a non-empty protocol name, got {0:?}")]
    InvalidProtocol(String),

    #[error("top-talkers must be at least 1, got {0}")]
    InvalidTopTalkers(usize),

    #[error("min-peer-sessions must be at least 1, got {0}")]
    InvalidMinPeerSessions(u64),

    #[error("fetch-timeout-sec must be at least 1, got {0}")]
    InvalidFetchTimeout(u64),

    #[error("command-timeout-sec must be at least 1, got {0}")]
    InvalidCommandTimeout(u64),

    #[error("syslog target must be host:port, got {0:?}")]
    InvalidSyslogTarget(String),
}

/// sasweep - clear IKE and IPsec SAs of peers holding excessive flow sessions.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "sasweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sweep the local device through the Junos CLI.
    Run(RunArgs),
    /// Sweep captured command output; write clear statements to a file.
    Replay(ReplayArgs),
}

/// Tunables shared by every command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SweepArgs {
    /// Minimum sessions in the flow table before anything is done.
    #[arg(long, default_value_t = DEFAULT_MIN_TOTAL_SESSIONS)]
    pub min_total_sessions: u64,

    /// Minimum sessions for a peer to be considered.
    #[arg(long, default_value_t = DEFAULT_MIN_PEER_SESSIONS)]
    pub min_peer_sessions: u64,

    /// Number of top talkers to clear.
    #[arg(long, default_value_t = DEFAULT_TOP_TALKERS)]
    pub top_talkers: usize,

    /// Execute the clear commands. Without this flag the run is a dry run.
    #[arg(long)]
    pub execute: bool,

    /// Verbosity: 0 silent, 1 info, 2 debug, 3 trace.
    #[arg(long, default_value_t = DEFAULT_DEBUG_LEVEL)]
    pub debug_level: u8,

    /// Protocol filter for the flow-session scan.
    #[arg(long, default_value = DEFAULT_PROTOCOL)]
    pub protocol: String,

    /// Timeout for the flow-session scan in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SEC)]
    pub fetch_timeout_sec: u64,

    /// Pause between a peer's IKE clear and its IPsec clears, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// Syslog receiver for run notifications (host:port).
    #[arg(long, default_value = DEFAULT_SYSLOG_TARGET)]
    pub syslog: String,

    /// Do not send syslog notifications.
    #[arg(long)]
    pub no_syslog: bool,

    /// Append a JSON summary line per run to this file.
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
}

impl SweepArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.protocol.is_empty()
            || !self
                .protocol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(CliError::InvalidProtocol(self.protocol.clone()));
        }
        if self.top_talkers == 0 {
            return Err(CliError::InvalidTopTalkers(self.top_talkers));
        }
        if self.min_peer_sessions == 0 {
            return Err(CliError::InvalidMinPeerSessions(self.min_peer_sessions));
        }
        if self.fetch_timeout_sec == 0 {
            return Err(CliError::InvalidFetchTimeout(self.fetch_timeout_sec));
        }
        if !self.no_syslog && !is_host_port(&self.syslog) {
            return Err(CliError::InvalidSyslogTarget(self.syslog.clone()));
        }
        Ok(())
    }

    /// Build the sweep configuration.
    pub fn to_config(&self) -> SweepConfig {
        SweepConfig {
            protocol: self.protocol.clone(),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_sec),
            thresholds: Thresholds {
                min_total_sessions: self.min_total_sessions,
                min_peer_sessions: self.min_peer_sessions,
                top_talkers: self.top_talkers,
            },
            dry_run: !self.execute,
            settle_delay: Duration::from_millis(self.settle_ms),
            debug_level: self.debug_level,
        }
    }
}

fn is_host_port(target: &str) -> bool {
    match target.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0),
        None => false,
    }
}

/// Arguments for the run command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Junos CLI program used to run operational commands.
    #[arg(long, default_value = DEFAULT_CLI_PROGRAM)]
    pub cli_program: PathBuf,

    /// Timeout for the association scan and each clear, in seconds.
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SEC)]
    pub command_timeout_sec: u64,
}

impl RunArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        self.sweep.validate()?;
        if self.command_timeout_sec == 0 {
            return Err(CliError::InvalidCommandTimeout(self.command_timeout_sec));
        }
        Ok(())
    }
}

/// Arguments for the replay command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// JSON output of `show security flow session protocol <p> | display json`.
    #[arg(long)]
    pub sessions: PathBuf,

    /// JSON output of `show security ipsec security-associations | display json`.
    #[arg(long)]
    pub associations: PathBuf,

    /// File the executed clear statements are appended to.
    #[arg(long)]
    pub commands_out: PathBuf,
}

impl ReplayArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        self.sweep.validate()
    }
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
