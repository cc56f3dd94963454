//! Device access for sasweep.
//!
//! This crate provides:
//! - Session and security-association record types
//! - `Device` trait for the table queries and clear commands
//! - Parsing of the Junos JSON rendering of both tables
//! - `CliDevice` (on-box), `ReplayDevice` (offline) and `MockDevice` (tests)

pub mod cli_device;
pub mod device;
pub mod mock;
pub mod replay;
pub mod reply;

pub use cli_device::CliDevice;
pub use device::{
    AssociationRecord, AssociationTable, ClearCommand, Device, DeviceError, SessionRecord,
    SessionTable, show_sessions_command, SHOW_ASSOCIATIONS_COMMAND,
};
pub use mock::{DeviceCall, MockDevice};
pub use replay::ReplayDevice;
pub use reply::{parse_association_table, parse_session_table, ReplyError};
