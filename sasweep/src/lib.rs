//! sasweep: clear the IKE and IPsec security associations of the peers
//! holding the most flow sessions of a protocol on a Junos SRX.
//!
//! The sweep runs in three stages:
//! 1. `aggregator` counts sessions per peer and selects the top talkers
//! 2. `indexer` maps the selected peers to their IPsec tunnel indices
//! 3. `mitigator` clears each peer's IKE association, then its IPsec ones
//!
//! `sweep::run_sweep` drives the stages against a `Device` with injected
//! logging, pausing and notification.

pub mod aggregator;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod exit;
pub mod indexer;
pub mod logger;
pub mod mitigator;
pub mod notifier;
pub mod sleeper;
pub mod summary;
pub mod sweep;

pub use aggregator::{aggregate, PeerSessionCounts, RankedPeer, Selection};
pub use cli::{parse_from, Cli, CliError, Command, ReplayArgs, RunArgs, SweepArgs};
pub use clock::{Clock, MockClock, SystemClock};
pub use commands::{
    cli_device, execute_replay, execute_run, execute_sweep, notifier_for, CommandError,
    CommandResult, ReplayResult, SweepResult,
};
pub use config::{SweepConfig, Thresholds};
pub use indexer::{index_all, index_for, PeerAssociations};
pub use logger::{Level, LogEntry, Logger, MockLogger, NullLogger, StderrLogger};
pub use mitigator::{
    mitigate, CommandOutcome, CommandStatus, MitigationOptions, MitigationReport,
};
pub use notifier::{MockNotifier, Notifier, NotifyError, NullNotifier, SyslogNotifier};
pub use sleeper::{MockSleeper, RealSleeper, Sleeper};
pub use summary::{RunSummary, SummaryError, SummaryWriter};
pub use sweep::{run_sweep, RunOutcome, SweepError};
