use serde::{Deserialize, Serialize};

/// Index of a router in `[0, num_nodes)`.
pub type NodeId = usize;

/// Link or path cost. The sentinel `RoutingParams::infinity` means unreachable.
pub type Cost = u32;

/// Sentinel used by the classic three-node lab topology.
pub const DEFAULT_INFINITY: Cost = 999;

/// Network-wide constants every node of one run must agree on.
///
/// Passed explicitly at construction so that independent runs (for example
/// property tests over random topologies) never share global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingParams {
    pub num_nodes: usize,
    pub infinity: Cost,
}

impl RoutingParams {
    pub fn new(num_nodes: usize, infinity: Cost) -> Self {
        assert!(num_nodes > 0, "a network needs at least one node");
        assert!(infinity > 0, "infinity sentinel must be positive");
        Self { num_nodes, infinity }
    }

    #[inline]
    pub fn is_infinite(&self, cost: Cost) -> bool {
        cost >= self.infinity
    }

    /// Saturating path-cost addition: anything involving infinity stays infinite,
    /// and finite sums never wrap around into a small number.
    #[inline]
    pub fn add(&self, a: Cost, b: Cost) -> Cost {
        if self.is_infinite(a) || self.is_infinite(b) {
            return self.infinity;
        }
        a.saturating_add(b).min(self.infinity)
    }

    /// Panics unless `id` names a node of this network.
    #[inline]
    pub fn check_node(&self, id: NodeId) {
        assert!(
            id < self.num_nodes,
            "node id {} out of range for a {}-node network",
            id,
            self.num_nodes
        );
    }

    /// Panics unless `cost` is a finite value or exactly the sentinel.
    #[inline]
    pub fn check_cost(&self, cost: Cost) {
        assert!(
            cost <= self.infinity,
            "cost {} exceeds the infinity sentinel {}",
            cost,
            self.infinity
        );
    }

    /// Panics unless `vector` has one entry per node, each a valid cost.
    pub fn check_vector(&self, vector: &[Cost]) {
        assert_eq!(
            vector.len(),
            self.num_nodes,
            "cost vector has {} entries, expected {}",
            vector.len(),
            self.num_nodes
        );
        for &cost in vector {
            self.check_cost(cost);
        }
    }

    /// Format a cost for tables and logs.
    pub fn fmt_cost(&self, cost: Cost) -> String {
        if self.is_infinite(cost) {
            "inf".to_string()
        } else {
            cost.to_string()
        }
    }
}
