//! Session aggregation and top-talker selection.
//!
//! Folds the flow-session scan into per-peer counts and picks the peers to
//! clear:
//! 1. Stop if the table holds fewer sessions than the global minimum
//! 2. Keep peers at or above the per-peer minimum
//! 3. Rank by count, highest first, ties by first appearance in the scan
//! 4. Keep the first `top_talkers`

use std::collections::HashMap;

use sasweep_device::{SessionRecord, SessionTable};
use serde::{Deserialize, Serialize};

use crate::config::Thresholds;

/// A peer selected for (or eligible for) remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPeer {
    pub address: String,
    pub sessions: u64,
}

#[derive(Debug, Clone, Copy)]
struct Tally {
    sessions: u64,
    first_seen: usize,
}

/// Session count per peer address.
#[derive(Debug, Clone, Default)]
pub struct PeerSessionCounts {
    tallies: HashMap<String, Tally>,
}

impl PeerSessionCounts {
    /// Count sessions per peer; sessions without an address are skipped.
    pub fn from_sessions(sessions: &[SessionRecord]) -> Self {
        let mut tallies: HashMap<String, Tally> = HashMap::new();
        for (position, peer) in sessions
            .iter()
            .filter_map(|s| s.peer.as_deref())
            .enumerate()
        {
            tallies
                .entry(peer.to_string())
                .or_insert(Tally {
                    sessions: 0,
                    first_seen: position,
                })
                .sessions += 1;
        }
        Self { tallies }
    }

    /// Number of distinct peers.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Sessions counted for `peer`.
    pub fn get(&self, peer: &str) -> Option<u64> {
        self.tallies.get(peer).map(|t| t.sessions)
    }

    /// Peers with at least `min_sessions`, ranked.
    pub fn ranked_at_least(&self, min_sessions: u64) -> Vec<RankedPeer> {
        let mut eligible: Vec<(&String, Tally)> = self
            .tallies
            .iter()
            .filter(|(_, t)| t.sessions >= min_sessions)
            .map(|(peer, t)| (peer, *t))
            .collect();

        eligible.sort_by(|(_, a), (_, b)| {
            b.sessions
                .cmp(&a.sessions)
                .then(a.first_seen.cmp(&b.first_seen))
        });

        eligible
            .into_iter()
            .map(|(peer, t)| RankedPeer {
                address: peer.clone(),
                sessions: t.sessions,
            })
            .collect()
    }
}

/// Outcome of aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Whether the table met the global minimum.
    pub proceed: bool,
    /// Session count reported by the device.
    pub total_sessions: u64,
    /// Distinct peers seen in the scan.
    pub unique_peers: usize,
    /// Every peer at or above the per-peer minimum, ranked.
    pub suspicious: Vec<RankedPeer>,
    /// The first `top_talkers` of `suspicious`; the only peers acted on.
    pub ranked: Vec<RankedPeer>,
}

/// Aggregate a session scan into a ranked selection.
pub fn aggregate(table: &SessionTable, thresholds: &Thresholds) -> Selection {
    let total_sessions = table.displayed_session_count;
    if total_sessions < thresholds.min_total_sessions {
        return Selection {
            proceed: false,
            total_sessions,
            ..Selection::default()
        };
    }

    let counts = PeerSessionCounts::from_sessions(&table.sessions);
    let suspicious = counts.ranked_at_least(thresholds.min_peer_sessions);
    let ranked = suspicious
        .iter()
        .take(thresholds.top_talkers)
        .cloned()
        .collect();

    Selection {
        proceed: true,
        total_sessions,
        unique_peers: counts.len(),
        suspicious,
        ranked,
    }
}
