//! Maps peers to the IPsec tunnel indices negotiated with them.

use std::collections::HashMap;

use sasweep_device::AssociationTable;

use crate::aggregator::RankedPeer;

/// Tunnel indices per remote gateway, deduplicated, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerAssociations {
    indices: HashMap<String, Vec<String>>,
}

impl PeerAssociations {
    /// Indices recorded for `peer`; empty when the peer has none.
    pub fn indices_for(&self, peer: &str) -> &[String] {
        self.indices.get(peer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of peers with an entry.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Restrict to the ranked peers. Every ranked peer gets an entry, possibly empty.
    pub fn project(&self, ranked: &[RankedPeer]) -> PeerAssociations {
        let indices = ranked
            .iter()
            .map(|peer| {
                (
                    peer.address.clone(),
                    self.indices_for(&peer.address).to_vec(),
                )
            })
            .collect();
        PeerAssociations { indices }
    }

    /// Peers and their indices, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.indices
            .iter()
            .map(|(peer, indices)| (peer.as_str(), indices.as_slice()))
    }

    /// Whether `peer` has an entry (even an empty one).
    pub fn contains(&self, peer: &str) -> bool {
        self.indices.contains_key(peer)
    }
}

/// Index every association in the table by remote gateway.
pub fn index_all(table: &AssociationTable) -> PeerAssociations {
    let mut indices: HashMap<String, Vec<String>> = HashMap::new();
    for record in &table.associations {
        let entry = indices.entry(record.remote_gateway.clone()).or_default();
        if !entry.contains(&record.tunnel_index) {
            entry.push(record.tunnel_index.clone());
        }
    }
    PeerAssociations { indices }
}

/// Index the associations of the ranked peers only.
pub fn index_for(table: &AssociationTable, ranked: &[RankedPeer]) -> PeerAssociations {
    index_all(table).project(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sasweep_device::AssociationRecord;

    fn table(records: &[(&str, &str)]) -> AssociationTable {
        AssociationTable {
            associations: records
                .iter()
                .map(|(gw, idx)| AssociationRecord::new(*gw, *idx))
                .collect(),
        }
    }

    fn peer(address: &str) -> RankedPeer {
        RankedPeer {
            address: address.to_string(),
            sessions: 1,
        }
    }

    #[test]
    fn test_groups_indices_by_gateway_in_table_order() {
        let table = table(&[("P1", "131073"), ("P2", "131074"), ("P1", "131075")]);
        let associations = index_for(&table, &[peer("P1"), peer("P2")]);

        assert_eq!(associations.indices_for("P1"), ["131073", "131075"]);
        assert_eq!(associations.indices_for("P2"), ["131074"]);
    }

    #[test]
    fn test_ranked_peer_without_associations_gets_empty_list() {
        let table = table(&[("P1", "131073")]);
        let associations = index_for(&table, &[peer("P1"), peer("P3")]);

        assert!(associations.contains("P3"));
        assert!(associations.indices_for("P3").is_empty());
        assert_eq!(associations.len(), 2);
    }

    #[test]
    fn test_unranked_gateways_are_excluded() {
        let table = table(&[("P1", "1"), ("P9", "2")]);
        let associations = index_for(&table, &[peer("P1")]);

        assert_eq!(associations.len(), 1);
        assert!(!associations.contains("P9"));
    }

    #[test]
    fn test_duplicate_indices_are_collapsed() {
        let table = table(&[("P1", "7"), ("P1", "7"), ("P1", "8")]);
        let associations = index_all(&table);
        assert_eq!(associations.indices_for("P1"), ["7", "8"]);
    }

    #[test]
    fn test_empty_table() {
        let associations = index_for(&table(&[]), &[peer("P1")]);
        assert!(associations.indices_for("P1").is_empty());

        let all = index_all(&table(&[]));
        assert!(all.is_empty());
    }

    #[test]
    fn test_unknown_peer_lookup_is_empty() {
        let associations = index_all(&table(&[("P1", "1")]));
        assert!(associations.indices_for("nobody").is_empty());
    }
}
