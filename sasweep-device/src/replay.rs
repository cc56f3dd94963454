//! Offline device backed by captured replies.
//!
//! Tables come from `| display json` captures of the two show commands.
//! Clear commands are not executed; each one is appended as a statement to
//! a command file for later on-device execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sasweep_fs::Filesystem;

use crate::device::{
    show_sessions_command, AssociationTable, ClearCommand, Device, DeviceError, SessionTable,
    SHOW_ASSOCIATIONS_COMMAND,
};
use crate::reply::{parse_association_table, parse_session_table};

/// Device replaying captured table replies.
#[derive(Debug, Clone)]
pub struct ReplayDevice<F: Filesystem> {
    fs: F,
    sessions_path: PathBuf,
    associations_path: PathBuf,
    commands_path: PathBuf,
}

impl<F: Filesystem> ReplayDevice<F> {
    pub fn new(
        fs: F,
        sessions_path: PathBuf,
        associations_path: PathBuf,
        commands_path: PathBuf,
    ) -> Self {
        Self {
            fs,
            sessions_path,
            associations_path,
            commands_path,
        }
    }

    /// File receiving the clear statements.
    pub fn commands_path(&self) -> &Path {
        &self.commands_path
    }

    fn append_statement(&self, cmd: ClearCommand) -> Result<(), DeviceError> {
        let line = format!("{}\n", cmd);
        self.fs.append(&self.commands_path, line.as_bytes())?;
        Ok(())
    }
}

impl<F: Filesystem> Device for ReplayDevice<F> {
    // The capture already holds the filtered table; protocol and timeout
    // only name the command in errors.
    fn session_table(
        &self,
        protocol: &str,
        _timeout: Duration,
    ) -> Result<SessionTable, DeviceError> {
        let json = self.fs.read_file(&self.sessions_path)?;
        parse_session_table(&json).map_err(|source| DeviceError::Reply {
            command: show_sessions_command(protocol),
            source,
        })
    }

    fn association_table(&self) -> Result<AssociationTable, DeviceError> {
        let json = self.fs.read_file(&self.associations_path)?;
        parse_association_table(&json).map_err(|source| DeviceError::Reply {
            command: SHOW_ASSOCIATIONS_COMMAND.to_string(),
            source,
        })
    }

    fn clear_ike_association(&self, peer: &str) -> Result<(), DeviceError> {
        self.append_statement(ClearCommand::IkePeer(peer.to_string()))
    }

    fn clear_ipsec_association(&self, index: &str) -> Result<(), DeviceError> {
        self.append_statement(ClearCommand::IpsecIndex(index.to_string()))
    }
}
