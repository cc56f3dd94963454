//! Issues the clear commands for the selected peers.
//!
//! Per peer, in ranked order: clear the IKE association, pause so the device
//! can settle, then clear every IPsec association by tunnel index. A failed
//! clear is logged and recorded; it never stops the batch.

use std::time::Duration;

use sasweep_device::{ClearCommand, Device, DeviceError};

use crate::aggregator::RankedPeer;
use crate::indexer::PeerAssociations;
use crate::logger::Logger;
use crate::sleeper::Sleeper;

/// Options for one mitigation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MitigationOptions {
    /// Report the commands without invoking them.
    pub dry_run: bool,
    /// Pause between a peer's IKE clear and its IPsec clears.
    pub settle_delay: Duration,
}

/// What happened to one clear command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Executed,
    /// Not invoked (dry run).
    Simulated,
    Failed { reason: String },
}

/// A clear command and its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: ClearCommand,
    pub status: CommandStatus,
}

/// Result of a mitigation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MitigationReport {
    /// Number of peers iterated; always the length of the ranked list.
    pub peers_processed: usize,
    /// Every command, in issue order.
    pub outcomes: Vec<CommandOutcome>,
}

impl MitigationReport {
    /// Commands invoked on the device.
    pub fn attempted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status != CommandStatus::Simulated)
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| *s == CommandStatus::Executed)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CommandStatus::Failed { .. }))
    }

    pub fn simulated(&self) -> usize {
        self.count(|s| *s == CommandStatus::Simulated)
    }

    fn count(&self, predicate: impl Fn(&CommandStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Clear the IKE and IPsec associations of every ranked peer.
///
/// Commands are only ever built for peers in `ranked`.
pub fn mitigate<D, S, L>(
    ranked: &[RankedPeer],
    associations: &PeerAssociations,
    options: MitigationOptions,
    device: &D,
    sleeper: &S,
    logger: &L,
) -> MitigationReport
where
    D: Device + ?Sized,
    S: Sleeper + ?Sized,
    L: Logger + ?Sized,
{
    let mut report = MitigationReport::default();

    logger.debug(if options.dry_run {
        "Statements to be executed (dry run):"
    } else {
        "Statements sent:"
    });

    for peer in ranked {
        let ike = ClearCommand::IkePeer(peer.address.clone());
        report.outcomes.push(issue(ike, options.dry_run, logger, |cmd| {
            device.clear_ike_association(cmd)
        }));

        if !options.dry_run {
            sleeper.pause(options.settle_delay);
        }

        for index in associations.indices_for(&peer.address) {
            let ipsec = ClearCommand::IpsecIndex(index.clone());
            report.outcomes.push(issue(ipsec, options.dry_run, logger, |cmd| {
                device.clear_ipsec_association(cmd)
            }));
        }

        report.peers_processed += 1;
    }

    report
}

fn issue<L, F>(command: ClearCommand, dry_run: bool, logger: &L, invoke: F) -> CommandOutcome
where
    L: Logger + ?Sized,
    F: FnOnce(&str) -> Result<(), DeviceError>,
{
    logger.debug(&format!("  {}", command));

    if dry_run {
        return CommandOutcome {
            command,
            status: CommandStatus::Simulated,
        };
    }

    let target = match &command {
        ClearCommand::IkePeer(peer) => peer,
        ClearCommand::IpsecIndex(index) => index,
    };

    let status = match invoke(target) {
        Ok(()) => CommandStatus::Executed,
        Err(e) => {
            logger.error(&format!(
                "RPC call for '{}' failed, continuing anyway: {}",
                command, e
            ));
            CommandStatus::Failed {
                reason: e.to_string(),
            }
        }
    };

    CommandOutcome { command, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index_for;
    use crate::logger::{Level, MockLogger};
    use crate::sleeper::MockSleeper;
    use sasweep_device::{
        AssociationRecord, AssociationTable, DeviceCall, MockDevice, SessionTable,
    };
    use std::sync::{Arc, RwLock};

    fn ranked(peers: &[&str]) -> Vec<RankedPeer> {
        peers
            .iter()
            .map(|p| RankedPeer {
                address: p.to_string(),
                sessions: 1_000,
            })
            .collect()
    }

    fn associations(records: &[(&str, &str)], peers: &[RankedPeer]) -> PeerAssociations {
        let table = AssociationTable {
            associations: records
                .iter()
                .map(|(gw, idx)| AssociationRecord::new(*gw, *idx))
                .collect(),
        };
        index_for(&table, peers)
    }

    fn live() -> MitigationOptions {
        MitigationOptions {
            dry_run: false,
            settle_delay: Duration::from_millis(500),
        }
    }

    fn dry() -> MitigationOptions {
        MitigationOptions {
            dry_run: true,
            ..live()
        }
    }

    fn ike(peer: &str) -> ClearCommand {
        ClearCommand::IkePeer(peer.to_string())
    }

    fn ipsec(index: &str) -> ClearCommand {
        ClearCommand::IpsecIndex(index.to_string())
    }

    // ===========================================
    // Command sequencing
    // ===========================================

    #[test]
    fn test_clears_ike_then_each_index() {
        let peers = ranked(&["P1"]);
        let assoc = associations(&[("P1", "7"), ("P1", "12")], &peers);
        let device = MockDevice::new();
        let sleeper = MockSleeper::new();
        let logger = MockLogger::new();

        let report = mitigate(&peers, &assoc, live(), &device, &sleeper, &logger);

        assert_eq!(
            device.clear_calls(),
            vec![ike("P1"), ipsec("7"), ipsec("12")]
        );
        assert_eq!(report.peers_processed, 1);
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 0);
        assert_eq!(sleeper.pauses(), vec![Duration::from_millis(500)]);
    }

    #[test]
    fn test_peers_processed_in_ranked_order() {
        let peers = ranked(&["B", "A"]);
        let assoc = associations(&[("A", "1"), ("B", "2")], &peers);
        let device = MockDevice::new();

        mitigate(&peers, &assoc, live(), &device, &MockSleeper::new(), &MockLogger::new());

        assert_eq!(
            device.clear_calls(),
            vec![ike("B"), ipsec("2"), ike("A"), ipsec("1")]
        );
    }

    #[test]
    fn test_peer_without_indices_only_gets_ike_clear() {
        let peers = ranked(&["P3"]);
        let assoc = associations(&[("P1", "7")], &peers);
        let device = MockDevice::new();
        let sleeper = MockSleeper::new();

        let report = mitigate(&peers, &assoc, live(), &device, &sleeper, &MockLogger::new());

        assert_eq!(device.clear_calls(), vec![ike("P3")]);
        assert_eq!(report.peers_processed, 1);
        assert_eq!(sleeper.pauses().len(), 1);
    }

    #[test]
    fn test_no_commands_for_unranked_peers() {
        let peers = ranked(&["P1"]);
        let assoc = associations(&[("P1", "7"), ("P2", "8")], &peers);
        let device = MockDevice::new();

        mitigate(&peers, &assoc, live(), &device, &MockSleeper::new(), &MockLogger::new());

        let calls = device.clear_calls();
        assert!(!calls.contains(&ike("P2")));
        assert!(!calls.contains(&ipsec("8")));
    }

    #[test]
    fn test_empty_ranked_list_issues_nothing() {
        let device = MockDevice::new();
        let report = mitigate(
            &[],
            &PeerAssociations::default(),
            live(),
            &device,
            &MockSleeper::new(),
            &MockLogger::new(),
        );

        assert!(device.calls().is_empty());
        assert_eq!(report.peers_processed, 0);
        assert!(report.outcomes.is_empty());
    }

    /// Device and sleeper sharing one event log, to check the pause position.
    #[derive(Default)]
    struct Recorder {
        events: Arc<RwLock<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.write().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.read().unwrap().clone()
        }
    }

    impl Device for Recorder {
        fn session_table(
            &self,
            _protocol: &str,
            _timeout: Duration,
        ) -> Result<SessionTable, DeviceError> {
            Ok(SessionTable::default())
        }

        fn association_table(&self) -> Result<AssociationTable, DeviceError> {
            Ok(AssociationTable::default())
        }

        fn clear_ike_association(&self, peer: &str) -> Result<(), DeviceError> {
            self.push(format!("ike {}", peer));
            Ok(())
        }

        fn clear_ipsec_association(&self, index: &str) -> Result<(), DeviceError> {
            self.push(format!("ipsec {}", index));
            Ok(())
        }
    }

    impl Sleeper for Recorder {
        fn pause(&self, duration: Duration) {
            self.push(format!("pause {}ms", duration.as_millis()));
        }
    }

    #[test]
    fn test_pause_separates_ike_clear_from_index_clears() {
        let peers = ranked(&["P1", "P2"]);
        let assoc = associations(&[("P1", "7"), ("P1", "12"), ("P2", "9")], &peers);
        let recorder = Recorder::default();

        mitigate(&peers, &assoc, live(), &recorder, &recorder, &MockLogger::new());

        assert_eq!(
            recorder.events(),
            vec![
                "ike P1",
                "pause 500ms",
                "ipsec 7",
                "ipsec 12",
                "ike P2",
                "pause 500ms",
                "ipsec 9",
            ]
        );
    }

    // ===========================================
    // Partial-failure tolerance
    // ===========================================

    #[test]
    fn test_failed_ike_clear_still_clears_indices() {
        let peers = ranked(&["P1"]);
        let assoc = associations(&[("P1", "7"), ("P1", "12")], &peers);
        let mut device = MockDevice::new();
        device.fail_clear_ike("P1");
        let logger = MockLogger::new();

        let report = mitigate(&peers, &assoc, live(), &device, &MockSleeper::new(), &logger);

        assert_eq!(
            device.clear_calls(),
            vec![ike("P1"), ipsec("7"), ipsec("12")]
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.peers_processed, 1);

        let errors = logger.messages_at(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with(
            "RPC call for 'clear security ike security-associations P1' failed, continuing anyway"
        ));
    }

    #[test]
    fn test_failed_index_clear_continues_with_next_index_and_peer() {
        let peers = ranked(&["P1", "P2"]);
        let assoc = associations(&[("P1", "7"), ("P1", "12"), ("P2", "9")], &peers);
        let mut device = MockDevice::new();
        device.fail_clear_ipsec("7");
        let logger = MockLogger::new();

        let report = mitigate(&peers, &assoc, live(), &device, &MockSleeper::new(), &logger);

        assert_eq!(device.clear_calls().len(), 5);
        assert_eq!(report.attempted(), 5);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.peers_processed, 2);
        assert_eq!(
            report.outcomes[1],
            CommandOutcome {
                command: ipsec("7"),
                status: CommandStatus::Failed {
                    reason: "`clear security ipsec security-associations index 7` rejected: simulated failure"
                        .to_string(),
                },
            }
        );
        assert!(logger.contains("index 7' failed, continuing anyway"));
    }

    #[test]
    fn test_every_command_failing_still_processes_all_peers() {
        let peers = ranked(&["P1", "P2"]);
        let assoc = associations(&[("P1", "7"), ("P2", "9")], &peers);
        let mut device = MockDevice::new();
        for target in ["P1", "P2"] {
            device.fail_clear_ike(target);
        }
        for index in ["7", "9"] {
            device.fail_clear_ipsec(index);
        }

        let report = mitigate(&peers, &assoc, live(), &device, &MockSleeper::new(), &MockLogger::new());

        assert_eq!(report.peers_processed, 2);
        assert_eq!(report.failed(), 4);
        assert_eq!(report.succeeded(), 0);
    }

    // ===========================================
    // Dry run
    // ===========================================

    #[test]
    fn test_dry_run_invokes_nothing_but_counts_peers() {
        let peers = ranked(&["P1", "P2", "P3"]);
        let assoc = associations(&[("P1", "7"), ("P2", "9")], &peers);
        let device = MockDevice::new();
        let sleeper = MockSleeper::new();

        let report = mitigate(&peers, &assoc, dry(), &device, &sleeper, &MockLogger::new());

        assert!(device.calls().is_empty());
        assert!(sleeper.pauses().is_empty());
        assert_eq!(report.peers_processed, 3);
        assert_eq!(report.simulated(), 5);
        assert_eq!(report.attempted(), 0);
    }

    #[test]
    fn test_dry_run_logs_statements() {
        let peers = ranked(&["P1"]);
        let assoc = associations(&[("P1", "7")], &peers);
        let logger = MockLogger::new();

        mitigate(&peers, &assoc, dry(), &MockDevice::new(), &MockSleeper::new(), &logger);

        assert_eq!(
            logger.messages_at(Level::Debug),
            vec![
                "Statements to be executed (dry run):".to_string(),
                "  clear security ike security-associations P1".to_string(),
                "  clear security ipsec security-associations index 7".to_string(),
            ]
        );
    }

    #[test]
    fn test_live_run_only_touches_clear_operations() {
        let peers = ranked(&["P1"]);
        let device = MockDevice::new();

        mitigate(
            &peers,
            &PeerAssociations::default(),
            live(),
            &device,
            &MockSleeper::new(),
            &MockLogger::new(),
        );

        assert!(device
            .calls()
            .iter()
            .all(|call| matches!(call, DeviceCall::Clear(_))));
    }
}
