//! Run summary journal.
//!
//! One JSON line per sweep, appended to a file that survives restarts, so a
//! scheduler can review what past runs found and cleared.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use sasweep_fs::{Filesystem, FsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::RankedPeer;
use crate::config::SweepConfig;
use crate::sweep::RunOutcome;

/// Errors from summary writing.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("failed to append summary: {0}")]
    Append(#[source] FsError),
}

/// Summary of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// RFC 3339 UTC time the run finished.
    pub timestamp: String,
    pub protocol: String,
    pub dry_run: bool,
    /// False when the table was below the global minimum.
    pub attempted: bool,
    pub total_sessions: u64,
    pub unique_peers: usize,
    pub suspicious_peers: usize,
    pub selected: Vec<RankedPeer>,
    pub peers_processed: usize,
    pub commands_attempted: usize,
    pub commands_succeeded: usize,
    pub commands_failed: usize,
    pub commands_simulated: usize,
}

impl RunSummary {
    /// Build a summary from a finished run.
    pub fn new(config: &SweepConfig, outcome: &RunOutcome, now: DateTime<Utc>) -> Self {
        let selection = &outcome.selection;
        let report = &outcome.report;
        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            protocol: config.protocol.clone(),
            dry_run: config.dry_run,
            attempted: outcome.attempted(),
            total_sessions: selection.total_sessions,
            unique_peers: selection.unique_peers,
            suspicious_peers: selection.suspicious.len(),
            selected: selection.ranked.clone(),
            peers_processed: report.peers_processed,
            commands_attempted: report.attempted(),
            commands_succeeded: report.succeeded(),
            commands_failed: report.failed(),
            commands_simulated: report.simulated(),
        }
    }

    /// Serialize to JSON line (no trailing newline).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("RunSummary serialization should never fail")
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Writer for the append-only summary file.
pub struct SummaryWriter<F: Filesystem> {
    fs: F,
    path: PathBuf,
}

impl<F: Filesystem> SummaryWriter<F> {
    pub fn new(fs: F, path: PathBuf) -> Self {
        Self { fs, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one summary line, creating the file if needed.
    pub fn append(&self, summary: &RunSummary) -> Result<(), SummaryError> {
        let line = format!("{}\n", summary.to_json());
        self.fs
            .append(&self.path, line.as_bytes())
            .map_err(SummaryError::Append)
    }
}
