//! On-box device driving the Junos operational CLI.
//!
//! Each operation runs `cli -c "<command>"`; table queries append
//! `| display json | no-more` and parse the reply. The CLI exits 0 even when
//! it rejects a command, so clear output is checked for `error:` lines.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::device::{
    show_sessions_command, AssociationTable, ClearCommand, Device, DeviceError, SessionTable,
    SHOW_ASSOCIATIONS_COMMAND,
};
use crate::reply::{parse_association_table, parse_session_table};

/// Default program used to reach the operational CLI.
pub const DEFAULT_CLI_PROGRAM: &str = "cli";

/// Default timeout for the SA query and for each clear command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const JSON_PIPE: &str = " | display json | no-more";

/// Device backed by the local Junos CLI.
#[derive(Debug, Clone)]
pub struct CliDevice {
    program: PathBuf,
    prefix_args: Vec<String>,
    command_timeout: Duration,
}

impl Default for CliDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CliDevice {
    /// Device using `cli` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_CLI_PROGRAM, Vec::new())
    }

    /// Device using `program`, invoked as `program <prefix_args..> -c <command>`.
    pub fn with_program(program: impl Into<PathBuf>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Builder: set the timeout for the SA query and clear commands.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn execute(&self, command: &str, timeout: Duration) -> Result<String, DeviceError> {
        let spawn_error = |source| DeviceError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Drain both pipes concurrently so a large reply cannot block the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait().map_err(spawn_error)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DeviceError::Timeout {
                        command: command.to_string(),
                        timeout,
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let reason = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("exited with {}", status));
            return Err(DeviceError::Rejected {
                command: command.to_string(),
                reason,
            });
        }

        Ok(stdout)
    }

    fn clear(&self, cmd: ClearCommand) -> Result<(), DeviceError> {
        let command = cmd.to_string();
        let output = self.execute(&command, self.command_timeout)?;
        match cli_error(&output) {
            Some(reason) => Err(DeviceError::Rejected { command, reason }),
            None => Ok(()),
        }
    }
}

impl Device for CliDevice {
    fn session_table(
        &self,
        protocol: &str,
        timeout: Duration,
    ) -> Result<SessionTable, DeviceError> {
        let command = show_sessions_command(protocol);
        let reply = self.execute(&format!("{}{}", command, JSON_PIPE), timeout)?;
        parse_session_table(&reply).map_err(|source| DeviceError::Reply { command, source })
    }

    fn association_table(&self) -> Result<AssociationTable, DeviceError> {
        let command = SHOW_ASSOCIATIONS_COMMAND.to_string();
        let reply = self.execute(&format!("{}{}", command, JSON_PIPE), self.command_timeout)?;
        parse_association_table(&reply).map_err(|source| DeviceError::Reply { command, source })
    }

    fn clear_ike_association(&self, peer: &str) -> Result<(), DeviceError> {
        self.clear(ClearCommand::IkePeer(peer.to_string()))
    }

    fn clear_ipsec_association(&self, index: &str) -> Result<(), DeviceError> {
        self.clear(ClearCommand::IpsecIndex(index.to_string()))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut out);
        }
        out
    })
}

/// First `error:` line the CLI printed, if any.
fn cli_error(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("error:"))
        .map(str::to_string)
}
