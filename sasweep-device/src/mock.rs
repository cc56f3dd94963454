//! In-memory device for tests.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::device::{
    show_sessions_command, AssociationRecord, AssociationTable, ClearCommand, Device,
    DeviceError, SessionRecord, SessionTable, SHOW_ASSOCIATIONS_COMMAND,
};

/// A call received by `MockDevice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    SessionTable { protocol: String, timeout: Duration },
    AssociationTable,
    Clear(ClearCommand),
}

/// Mock device with scripted tables and failures.
/// Cloning creates a new handle to the same call log.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    sessions: Vec<SessionRecord>,
    displayed_count: Option<u64>,
    associations: Vec<AssociationRecord>,
    session_failure: Option<String>,
    association_failure: Option<String>,
    failing_peers: HashSet<String>,
    failing_indices: HashSet<String>,
    calls: Arc<RwLock<Vec<DeviceCall>>>,
}

impl MockDevice {
    /// Create a device with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` sessions attributed to `peer`.
    pub fn add_sessions(&mut self, peer: &str, count: usize) {
        self.sessions
            .extend(std::iter::repeat_with(|| SessionRecord::new(peer)).take(count));
    }

    /// Add a session without a source address.
    pub fn add_unattributed_session(&mut self) {
        self.sessions.push(SessionRecord::unattributed());
    }

    /// Override the reported session count (defaults to the number of sessions added).
    pub fn set_displayed_count(&mut self, count: u64) {
        self.displayed_count = Some(count);
    }

    /// Add a security association.
    pub fn add_association(&mut self, remote_gateway: &str, tunnel_index: &str) {
        self.associations
            .push(AssociationRecord::new(remote_gateway, tunnel_index));
    }

    /// Make the session scan fail.
    pub fn fail_session_table(&mut self, reason: &str) {
        self.session_failure = Some(reason.to_string());
    }

    /// Make the association scan fail.
    pub fn fail_association_table(&mut self, reason: &str) {
        self.association_failure = Some(reason.to_string());
    }

    /// Make the IKE clear for `peer` fail.
    pub fn fail_clear_ike(&mut self, peer: &str) {
        self.failing_peers.insert(peer.to_string());
    }

    /// Make the IPsec clear for `index` fail.
    pub fn fail_clear_ipsec(&mut self, index: &str) {
        self.failing_indices.insert(index.to_string());
    }

    /// All calls received, in order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear commands received, in order.
    pub fn clear_calls(&self) -> Vec<ClearCommand> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Clear(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.write().unwrap().push(call);
    }

    fn clear(&self, cmd: ClearCommand, fails: bool) -> Result<(), DeviceError> {
        let command = cmd.to_string();
        self.record(DeviceCall::Clear(cmd));
        if fails {
            return Err(DeviceError::Rejected {
                command,
                reason: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Device for MockDevice {
    fn session_table(
        &self,
        protocol: &str,
        timeout: Duration,
    ) -> Result<SessionTable, DeviceError> {
        self.record(DeviceCall::SessionTable {
            protocol: protocol.to_string(),
            timeout,
        });

        if let Some(reason) = &self.session_failure {
            return Err(DeviceError::Rejected {
                command: show_sessions_command(protocol),
                reason: reason.clone(),
            });
        }

        Ok(SessionTable {
            displayed_session_count: self
                .displayed_count
                .unwrap_or(self.sessions.len() as u64),
            sessions: self.sessions.clone(),
        })
    }

    fn association_table(&self) -> Result<AssociationTable, DeviceError> {
        self.record(DeviceCall::AssociationTable);

        if let Some(reason) = &self.association_failure {
            return Err(DeviceError::Rejected {
                command: SHOW_ASSOCIATIONS_COMMAND.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(AssociationTable {
            associations: self.associations.clone(),
        })
    }

    fn clear_ike_association(&self, peer: &str) -> Result<(), DeviceError> {
        let fails = self.failing_peers.contains(peer);
        self.clear(ClearCommand::IkePeer(peer.to_string()), fails)
    }

    fn clear_ipsec_association(&self, index: &str) -> Result<(), DeviceError> {
        let fails = self.failing_indices.contains(index);
        self.clear(ClearCommand::IpsecIndex(index.to_string()), fails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displayed_count_defaults_to_sessions_added() {
        let mut device = MockDevice::new();
        device.add_sessions("192.0.2.1", 3);
        device.add_unattributed_session();

        let table = device
            .session_table("ah", Duration::from_secs(1))
            .expect("sessions");
        assert_eq!(table.displayed_session_count, 4);
        assert_eq!(table.sessions.len(), 4);
    }

    #[test]
    fn test_displayed_count_override() {
        let mut device = MockDevice::new();
        device.add_sessions("192.0.2.1", 2);
        device.set_displayed_count(12000);

        let table = device
            .session_table("ah", Duration::from_secs(1))
            .expect("sessions");
        assert_eq!(table.displayed_session_count, 12000);
    }

    #[test]
    fn test_records_calls_in_order() {
        let device = MockDevice::new();
        device
            .session_table("esp", Duration::from_secs(5))
            .expect("sessions");
        device.association_table().expect("associations");
        device.clear_ike_association("192.0.2.1").expect("ike");
        device.clear_ipsec_association("7").expect("ipsec");

        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::SessionTable {
                    protocol: "esp".to_string(),
                    timeout: Duration::from_secs(5)
                },
                DeviceCall::AssociationTable,
                DeviceCall::Clear(ClearCommand::IkePeer("192.0.2.1".to_string())),
                DeviceCall::Clear(ClearCommand::IpsecIndex("7".to_string())),
            ]
        );
    }

    #[test]
    fn test_scripted_clear_failures_are_still_recorded() {
        let mut device = MockDevice::new();
        device.fail_clear_ike("192.0.2.1");
        device.fail_clear_ipsec("7");

        assert!(device.clear_ike_association("192.0.2.1").is_err());
        assert!(device.clear_ike_association("192.0.2.2").is_ok());
        assert!(device.clear_ipsec_association("7").is_err());
        assert_eq!(device.clear_calls().len(), 3);
    }

    #[test]
    fn test_scripted_fetch_failures() {
        let mut device = MockDevice::new();
        device.fail_session_table("rpc timeout");
        device.fail_association_table("connection lost");

        let err = device
            .session_table("ah", Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("rpc timeout"));
        assert!(device.association_table().is_err());
    }

    #[test]
    fn test_clone_shares_call_log() {
        let device = MockDevice::new();
        let handle = device.clone();
        handle.clear_ipsec_association("12").expect("clear");
        assert_eq!(device.clear_calls().len(), 1);
    }
}
