//! Sweep configuration.

use std::time::Duration;

/// Default protocol filter for the flow-session scan.
pub const DEFAULT_PROTOCOL: &str = "ah";

/// Default minimum number of sessions in the table before anything is done.
pub const DEFAULT_MIN_TOTAL_SESSIONS: u64 = 10_000;

/// Default minimum number of sessions for a peer to be suspicious.
pub const DEFAULT_MIN_PEER_SESSIONS: u64 = 1_000;

/// Default number of top talkers to clear.
pub const DEFAULT_TOP_TALKERS: usize = 3;

/// Default timeout for the flow-session scan (large tables take minutes).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(360);

/// Default pause between a peer's IKE clear and its IPsec clears.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Default debug level (2 = debug).
pub const DEFAULT_DEBUG_LEVEL: u8 = 2;

/// Selection thresholds. Compared literally; never validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Minimum total sessions in the table.
    pub min_total_sessions: u64,
    /// Minimum sessions for a single peer.
    pub min_peer_sessions: u64,
    /// Maximum number of peers selected.
    pub top_talkers: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_total_sessions: DEFAULT_MIN_TOTAL_SESSIONS,
            min_peer_sessions: DEFAULT_MIN_PEER_SESSIONS,
            top_talkers: DEFAULT_TOP_TALKERS,
        }
    }
}

/// Configuration of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub protocol: String,
    pub fetch_timeout: Duration,
    pub thresholds: Thresholds,
    /// Report the clear commands without executing them.
    pub dry_run: bool,
    pub settle_delay: Duration,
    pub debug_level: u8,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            thresholds: Thresholds::default(),
            dry_run: true,
            settle_delay: DEFAULT_SETTLE_DELAY,
            debug_level: DEFAULT_DEBUG_LEVEL,
        }
    }
}

impl SweepConfig {
    /// Builder: set thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Builder: set dry_run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: set protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Builder: set settle_delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Builder: set fetch_timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: set debug_level.
    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }
}
