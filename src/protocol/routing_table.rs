use serde::{Deserialize, Serialize};
use crate::types::NodeId;

/// Destination → next hop. One slot per node; `None` means no known route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    entries: Vec<Option<NodeId>>,
}

impl RoutingTable {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            entries: vec![None; num_nodes],
        }
    }

    pub fn add_route(&mut self, destination: NodeId, next_hop: NodeId) {
        self.entries[destination] = Some(next_hop);
    }

    pub fn remove_route(&mut self, destination: NodeId) {
        self.entries[destination] = None;
    }

    pub fn get_route(&self, destination: NodeId) -> Option<NodeId> {
        self.entries.get(destination).copied().flatten()
    }

    /// True if traffic for `destination` currently leaves through `neighbor`.
    pub fn routes_via(&self, destination: NodeId, neighbor: NodeId) -> bool {
        self.get_route(destination) == Some(neighbor)
    }

    /// Number of destinations with a known route.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(destination, next_hop)` pairs in ascending destination order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(dest, hop)| hop.map(|h| (dest, h)))
    }
}
