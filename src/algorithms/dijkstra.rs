use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::network::Topology;
use crate::types::{Cost, NodeId};

/// Reference shortest paths from one source, computed with full knowledge of
/// the topology. Used to check what the distributed computation converged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    pub source: NodeId,
    pub cost: Vec<Cost>,
    previous: Vec<Option<NodeId>>,
}

#[derive(Debug, PartialEq, Eq)]
struct State {
    cost: Cost,
    router: NodeId,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.router.cmp(&self.router))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn calculate_shortest_paths(topology: &Topology, source: NodeId) -> ShortestPaths {
    let params = topology.params();
    let n = params.num_nodes;
    let mut cost = vec![params.infinity; n];
    let mut previous = vec![None; n];
    let mut heap = BinaryHeap::new();

    cost[source] = 0;
    heap.push(State { cost: 0, router: source });

    while let Some(State { cost: d, router }) = heap.pop() {
        // Skip if we've already found a better path
        if d > cost[router] {
            continue;
        }

        for (neighbor, link_cost) in topology.get_neighbors(router) {
            let candidate = params.add(d, link_cost);
            if !params.is_infinite(candidate) && candidate < cost[neighbor] {
                cost[neighbor] = candidate;
                previous[neighbor] = Some(router);
                heap.push(State { cost: candidate, router: neighbor });
            }
        }
    }

    ShortestPaths { source, cost, previous }
}

/// `result[i][j]` = true shortest cost from `i` to `j`.
pub fn all_pairs(topology: &Topology) -> Vec<Vec<Cost>> {
    (0..topology.num_nodes())
        .map(|s| calculate_shortest_paths(topology, s).cost)
        .collect()
}

impl ShortestPaths {
    /// Hop sequence `source, ..., dest`, or empty if unreachable.
    pub fn path_to(&self, dest: NodeId) -> Vec<NodeId> {
        if dest != self.source && self.previous[dest].is_none() {
            return Vec::new();
        }

        let mut path = Vec::new();
        let mut current = Some(dest);
        while let Some(router) = current {
            path.push(router);
            current = self.previous[router];
        }

        path.reverse();
        path
    }

    pub fn find_next_hop(&self, dest: NodeId) -> Option<NodeId> {
        self.path_to(dest).get(1).copied()
    }
}
