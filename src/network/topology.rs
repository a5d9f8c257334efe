use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Cost, NodeId, RoutingParams};

/// A single physical link as seen from both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,
    pub cost_ab: Cost,
    pub cost_ba: Cost,
}

/// Ground-truth link costs of the simulated network.
///
/// `costs[i][j]` is the cost router `i` uses for its link to `j`. A link
/// either exists in both directions or in neither, but the two ends may
/// weigh it differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    params: RoutingParams,
    costs: Vec<Vec<Cost>>,
}

impl Topology {
    /// A network of isolated routers.
    pub fn new(params: RoutingParams) -> Self {
        let n = params.num_nodes;
        let mut costs = vec![vec![params.infinity; n]; n];
        for (i, row) in costs.iter_mut().enumerate() {
            row[i] = 0;
        }
        Self { params, costs }
    }

    pub fn from_matrix(params: RoutingParams, costs: Vec<Vec<Cost>>) -> Result<Self> {
        let n = params.num_nodes;
        if costs.len() != n {
            bail!("cost matrix has {} rows, expected {}", costs.len(), n);
        }
        for (i, row) in costs.iter().enumerate() {
            if row.len() != n {
                bail!("row {} of the cost matrix has {} entries, expected {}", i, row.len(), n);
            }
        }
        for (i, row) in costs.iter().enumerate() {
            if row[i] != 0 {
                bail!("router {} must have cost 0 to itself, found {}", i, row[i]);
            }
            for (j, &cost) in row.iter().enumerate() {
                if cost > params.infinity {
                    bail!(
                        "cost {} from {} to {} exceeds infinity {}",
                        cost, i, j, params.infinity
                    );
                }
                if params.is_infinite(cost) != params.is_infinite(costs[j][i]) {
                    bail!("link {}-{} exists in only one direction", i, j);
                }
            }
        }
        Ok(Self { params, costs })
    }

    pub fn params(&self) -> RoutingParams {
        self.params
    }

    pub fn num_nodes(&self) -> usize {
        self.params.num_nodes
    }

    /// Initial cost vector handed to router `node` at construction.
    pub fn node_costs(&self, node: NodeId) -> &[Cost] {
        &self.costs[node]
    }

    pub fn link_cost(&self, from: NodeId, to: NodeId) -> Cost {
        self.costs[from][to]
    }

    /// Set the cost of link `a`-`b` in both directions. Infinity removes it.
    pub fn set_link(&mut self, a: NodeId, b: NodeId, cost: Cost) {
        self.params.check_node(a);
        self.params.check_node(b);
        self.params.check_cost(cost);
        assert_ne!(a, b, "a link needs two distinct routers");
        self.costs[a][b] = cost;
        self.costs[b][a] = cost;
    }

    pub fn get_neighbors(&self, node: NodeId) -> Vec<(NodeId, Cost)> {
        self.costs[node]
            .iter()
            .enumerate()
            .filter(|&(j, &c)| j != node && !self.params.is_infinite(c))
            .map(|(j, &c)| (j, c))
            .collect()
    }

    /// Every existing link once, with `a < b`.
    pub fn links(&self) -> Vec<Link> {
        let n = self.num_nodes();
        let mut links = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if !self.params.is_infinite(self.costs[a][b]) {
                    links.push(Link {
                        a,
                        b,
                        cost_ab: self.costs[a][b],
                        cost_ba: self.costs[b][a],
                    });
                }
            }
        }
        links
    }
}
