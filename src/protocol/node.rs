use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::types::{Cost, NodeId, RoutingParams};
use super::messages::RouterPacket;
use super::routing_table::RoutingTable;
use super::sink::PacketSink;

/// One router of a distance-vector network.
///
/// The node only knows its direct link costs and the vectors its neighbors
/// have advertised. It is purely reactive: each handler runs to completion,
/// and outbound vectors are handed to the caller's [`PacketSink`].
#[derive(Debug, Clone)]
pub struct RoutingNode {
    id: NodeId,
    params: RoutingParams,
    costs: Vec<Cost>,
    /// `distance[k][j]`: cost from `k` to `j` as last reported by `k`.
    /// Row `id` is our own advertised vector.
    distance: Vec<Vec<Cost>>,
    routes: RoutingTable,
    recomputations: u64,
    broadcasts: u64,
}

/// Owned copy of a node's tables, for presentation and cross-task queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub params: RoutingParams,
    pub costs: Vec<Cost>,
    pub distance: Vec<Vec<Cost>>,
    pub routes: RoutingTable,
}

impl NodeSnapshot {
    pub fn distance_vector(&self) -> &[Cost] {
        &self.distance[self.id]
    }

    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.params.num_nodes)
            .filter(move |&k| k != self.id && !self.params.is_infinite(self.costs[k]))
    }
}

impl RoutingNode {
    /// Build the node and announce its initial vector to every neighbor.
    ///
    /// # Panics
    /// If `id` is out of range or `costs` is not a valid length-N cost vector.
    pub fn new<S: PacketSink + ?Sized>(
        id: NodeId,
        params: RoutingParams,
        costs: &[Cost],
        sink: &mut S,
    ) -> Self {
        params.check_node(id);
        params.check_vector(costs);

        let n = params.num_nodes;
        let mut costs = costs.to_vec();
        costs[id] = 0;

        // Every node reaches itself for free; the rest is unknown until heard.
        let mut distance = vec![vec![params.infinity; n]; n];
        for (k, row) in distance.iter_mut().enumerate() {
            row[k] = 0;
        }
        distance[id].copy_from_slice(&costs);

        let mut routes = RoutingTable::new(n);
        for (dest, &cost) in costs.iter().enumerate() {
            if dest != id && !params.is_infinite(cost) {
                routes.add_route(dest, dest);
            }
        }

        let mut node = Self {
            id,
            params,
            costs,
            distance,
            routes,
            recomputations: 0,
            broadcasts: 0,
        };

        info!(
            "Router {} up with {} neighbor(s), vector {:?}",
            id,
            node.neighbors().count(),
            node.distance[id]
        );
        node.broadcast(sink);
        node
    }

    /// Apply a new cost for the direct link to `dest` and re-relax.
    ///
    /// `new_cost` may be the infinity sentinel (link removed) or any finite
    /// value, including for a link that did not exist before.
    ///
    /// # Panics
    /// If `dest` is this node, out of range, or `new_cost` exceeds the sentinel.
    pub fn update_link_cost<S: PacketSink + ?Sized>(
        &mut self,
        dest: NodeId,
        new_cost: Cost,
        sink: &mut S,
    ) {
        self.params.check_node(dest);
        self.params.check_cost(new_cost);
        assert_ne!(dest, self.id, "router {} cannot change a link to itself", self.id);

        let was_neighbor = self.is_neighbor(dest);
        debug!(
            "Router {}: link to {} now costs {}",
            self.id,
            dest,
            self.params.fmt_cost(new_cost)
        );
        self.costs[dest] = new_cost;

        if was_neighbor && !self.is_neighbor(dest) {
            // Whatever `dest` told us is no longer reachable knowledge.
            self.forget_row(dest);
        }

        let changed = self.recompute();
        if !changed.is_empty() {
            self.broadcast(sink);
        } else if !was_neighbor && self.is_neighbor(dest) {
            // A fresh adjacency must learn our vector even if it did not move.
            trace!("Router {}: greeting new neighbor {}", self.id, dest);
            sink.deliver(self.advertisement_for(dest));
        }
    }

    /// Take in a neighbor's advertised vector and re-relax.
    ///
    /// Vectors from nodes that are not currently neighbors are ignored,
    /// since a link may have gone down while the packet was in flight.
    ///
    /// # Panics
    /// If the packet is malformed or not addressed to this node.
    pub fn recv_update<S: PacketSink + ?Sized>(&mut self, packet: RouterPacket, sink: &mut S) {
        let from = packet.source_id;
        self.params.check_node(from);
        self.params.check_vector(&packet.mincost);
        assert_eq!(
            packet.dest_id, self.id,
            "packet for router {} delivered to router {}",
            packet.dest_id, self.id
        );
        assert_ne!(from, self.id, "router {} received its own vector", self.id);

        if !self.is_neighbor(from) {
            debug!("Router {}: ignoring vector from non-neighbor {}", self.id, from);
            return;
        }

        trace!("Router {}: vector from {}: {:?}", self.id, from, packet.mincost);
        self.distance[from] = packet.mincost;

        let changed = self.recompute();
        if !changed.is_empty() {
            self.broadcast(sink);
        }
    }

    /// Bellman-Ford relaxation of our own row against every neighbor's row.
    ///
    /// Returns the destinations whose cost or next hop moved.
    fn recompute(&mut self) -> Vec<NodeId> {
        self.recomputations += 1;
        let mut changed = Vec::new();

        for dest in 0..self.params.num_nodes {
            if dest == self.id {
                continue;
            }

            let (best, best_hop) = self.best_path(dest);
            let current = self.distance[self.id][dest];

            // Keep the existing next hop as long as it still achieves the minimum.
            let route_holds = match self.routes.get_route(dest) {
                Some(hop) => !self.params.is_infinite(best) && self.cost_via(hop, dest) == best,
                None => self.params.is_infinite(best),
            };

            if best == current && route_holds {
                continue;
            }

            self.distance[self.id][dest] = best;
            match best_hop {
                Some(hop) => self.routes.add_route(dest, hop),
                None => self.routes.remove_route(dest),
            }
            debug!(
                "Router {}: to {} cost {} -> {} via {:?}",
                self.id,
                dest,
                self.params.fmt_cost(current),
                self.params.fmt_cost(best),
                best_hop
            );
            changed.push(dest);
        }

        changed
    }

    /// Cheapest neighbor for `dest`; ties go to the lowest neighbor id.
    fn best_path(&self, dest: NodeId) -> (Cost, Option<NodeId>) {
        let mut best = self.params.infinity;
        let mut best_hop = None;

        for nbr in self.neighbors() {
            let candidate = self.cost_via(nbr, dest);
            if !self.params.is_infinite(candidate) && candidate < best {
                best = candidate;
                best_hop = Some(nbr);
            }
        }

        (best, best_hop)
    }

    #[inline]
    fn cost_via(&self, nbr: NodeId, dest: NodeId) -> Cost {
        self.params.add(self.costs[nbr], self.distance[nbr][dest])
    }

    fn forget_row(&mut self, nbr: NodeId) {
        let inf = self.params.infinity;
        self.distance[nbr].iter_mut().for_each(|c| *c = inf);
        self.distance[nbr][nbr] = 0;
    }

    fn broadcast<S: PacketSink + ?Sized>(&mut self, sink: &mut S) {
        self.broadcasts += 1;
        for nbr in self.neighbors() {
            let packet = self.advertisement_for(nbr);
            trace!("Router {}: send {}", self.id, packet);
            sink.deliver(packet);
        }
    }

    /// Our vector as `neighbor` is allowed to see it: every destination we
    /// currently reach through `neighbor` is poisoned to infinity.
    pub fn advertisement_for(&self, neighbor: NodeId) -> RouterPacket {
        let mut mincost = self.distance[self.id].clone();
        for (dest, cost) in mincost.iter_mut().enumerate() {
            if dest != neighbor && self.routes.routes_via(dest, neighbor) {
                *cost = self.params.infinity;
            }
        }
        RouterPacket::new(self.id, neighbor, mincost)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn params(&self) -> RoutingParams {
        self.params
    }

    pub fn costs(&self) -> &[Cost] {
        &self.costs
    }

    pub fn distance_table(&self) -> &[Vec<Cost>] {
        &self.distance
    }

    /// Our own advertised vector (row `id` of the distance table).
    pub fn distance_vector(&self) -> &[Cost] {
        &self.distance[self.id]
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn next_hop(&self, dest: NodeId) -> Option<NodeId> {
        self.routes.get_route(dest)
    }

    pub fn is_neighbor(&self, node: NodeId) -> bool {
        node != self.id && !self.params.is_infinite(self.costs[node])
    }

    /// Current neighbors in ascending id order.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.params.num_nodes).filter(move |&k| self.is_neighbor(k))
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn broadcasts(&self) -> u64 {
        self.broadcasts
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id,
            params: self.params,
            costs: self.costs.clone(),
            distance: self.distance.clone(),
            routes: self.routes.clone(),
        }
    }
}
