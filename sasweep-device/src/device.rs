//! Device abstraction: table records, clear commands and the `Device` trait.

use std::fmt;
use std::time::Duration;

use sasweep_fs::FsError;
use thiserror::Error;

use crate::reply::ReplyError;

/// Operational command listing the IPsec security associations.
pub const SHOW_ASSOCIATIONS_COMMAND: &str = "show security ipsec security-associations";

/// Operational command listing flow sessions of one protocol.
pub fn show_sessions_command(protocol: &str) -> String {
    format!("show security flow session protocol {}", protocol)
}

/// One flow session, attributed to the source address of its inbound wing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// `None` when the device reported no usable source address.
    pub peer: Option<String>,
}

impl SessionRecord {
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: Some(peer.into()),
        }
    }

    /// A session without a source address.
    pub fn unattributed() -> Self {
        Self { peer: None }
    }
}

/// Result of a flow-session scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTable {
    /// Session count as reported by the device (may exceed `sessions.len()`).
    pub displayed_session_count: u64,
    /// Sessions in scan order.
    pub sessions: Vec<SessionRecord>,
}

/// One IPsec security association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRecord {
    pub remote_gateway: String,
    /// Opaque device token, not necessarily numeric.
    pub tunnel_index: String,
}

impl AssociationRecord {
    pub fn new(remote_gateway: impl Into<String>, tunnel_index: impl Into<String>) -> Self {
        Self {
            remote_gateway: remote_gateway.into(),
            tunnel_index: tunnel_index.into(),
        }
    }
}

/// Result of a security-association scan, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationTable {
    pub associations: Vec<AssociationRecord>,
}

/// A mutating command issued against the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClearCommand {
    /// Clear the IKE security association(s) of a peer.
    IkePeer(String),
    /// Clear one IPsec security association by tunnel index.
    IpsecIndex(String),
}

impl fmt::Display for ClearCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearCommand::IkePeer(peer) => {
                write!(f, "clear security ike security-associations {}", peer)
            }
            ClearCommand::IpsecIndex(index) => {
                write!(f, "clear security ipsec security-associations index {}", index)
            }
        }
    }
}

/// Errors from device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("malformed reply to `{command}`: {source}")]
    Reply {
        command: String,
        #[source]
        source: ReplyError,
    },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` rejected: {reason}")]
    Rejected { command: String, reason: String },

    #[error("capture error: {0}")]
    Capture(#[from] FsError),
}

/// Trait for the device collaborator.
///
/// Table queries are fatal to a run when they fail; clear failures are
/// recoverable and the caller keeps going.
pub trait Device: Send + Sync {
    /// Scan the flow-session table for `protocol`, waiting at most `timeout`.
    fn session_table(&self, protocol: &str, timeout: Duration)
        -> Result<SessionTable, DeviceError>;

    /// Scan the IPsec security-association table.
    fn association_table(&self) -> Result<AssociationTable, DeviceError>;

    /// Clear the IKE security association(s) of `peer`.
    fn clear_ike_association(&self, peer: &str) -> Result<(), DeviceError>;

    /// Clear the IPsec security association with tunnel index `index`.
    fn clear_ipsec_association(&self, index: &str) -> Result<(), DeviceError>;
}
