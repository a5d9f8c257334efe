use std::collections::HashMap;

use anyhow::Result;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::algorithms::dijkstra::calculate_shortest_paths;
use crate::config::{ScenarioConfig, SimulationConfig};
use crate::protocol::{NodeSnapshot, PacketSink, RouterPacket, RoutingNode};
use crate::types::{Cost, NodeId};
use super::event::{Event, EventKind, Scheduler};
use super::time::VirtualTime;
use super::topology::Topology;

/// The simulated wire. Every packet a router hands over is scheduled for
/// delivery after the propagation delay plus random jitter. Packets on one
/// directed link never overtake each other.
#[derive(Debug)]
struct Transmitter {
    scheduler: Scheduler,
    now: VirtualTime,
    rng: StdRng,
    propagation_delay: u64,
    max_jitter: u64,
    last_arrival: HashMap<(NodeId, NodeId), VirtualTime>,
    sent: u64,
}

impl PacketSink for Transmitter {
    fn deliver(&mut self, packet: RouterPacket) {
        let jitter = if self.max_jitter > 0 {
            self.rng.gen_range(0..=self.max_jitter)
        } else {
            0
        };
        let link = (packet.source_id, packet.dest_id);
        let mut at = self.now.plus(self.propagation_delay + jitter);
        if let Some(&previous) = self.last_arrival.get(&link) {
            at = at.max(previous);
        }
        self.last_arrival.insert(link, at);
        self.sent += 1;
        self.scheduler.schedule(at, EventKind::Deliver(packet));
    }
}

/// Summary of a [`Simulator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub events_processed: u64,
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub final_time: VirtualTime,
    /// False if the delivery budget ran out with packets still in flight.
    pub converged: bool,
    pub broadcasts: Vec<u64>,
}

/// Where a router's converged state disagrees with the true shortest paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discrepancy {
    Cost {
        node: NodeId,
        dest: NodeId,
        expected: Cost,
        actual: Cost,
    },
    /// `route[dest]` does not achieve the advertised cost. `reference_hop`
    /// is where one true shortest path leaves `node`.
    Route {
        node: NodeId,
        dest: NodeId,
        next_hop: Option<NodeId>,
        reference_hop: Option<NodeId>,
    },
}

/// Check each router's vector against Dijkstra over `topology`, and that
/// every route achieves its advertised cost.
pub fn verify_snapshots(topology: &Topology, snapshots: &[NodeSnapshot]) -> Vec<Discrepancy> {
    let params = topology.params();
    let mut found = Vec::new();

    for snap in snapshots {
        let id = snap.id;
        let truth = calculate_shortest_paths(topology, id);
        for dest in 0..params.num_nodes {
            let actual = snap.distance_vector()[dest];
            if actual != truth.cost[dest] {
                found.push(Discrepancy::Cost {
                    node: id,
                    dest,
                    expected: truth.cost[dest],
                    actual,
                });
            }
            if dest == id {
                continue;
            }
            let next_hop = snap.routes.get_route(dest);
            let route_ok = match next_hop {
                Some(hop) => params.add(snap.costs[hop], snap.distance[hop][dest]) == actual,
                None => params.is_infinite(actual),
            };
            if !route_ok {
                found.push(Discrepancy::Route {
                    node: id,
                    dest,
                    next_hop,
                    reference_hop: truth.find_next_hop(dest),
                });
            }
        }
    }
    found
}

/// Discrete-event driver for a whole network of [`RoutingNode`]s.
///
/// Single-threaded: exactly one event is dispatched to exactly one router
/// at a time, and each handler runs to completion before the next event.
pub struct Simulator {
    topology: Topology,
    nodes: Vec<RoutingNode>,
    link: Transmitter,
    max_events: u64,
    events_processed: u64,
    delivered: u64,
}

impl Simulator {
    /// Build every router (each announces itself at T=0).
    pub fn new(topology: Topology, settings: &SimulationConfig) -> Self {
        let mut link = Transmitter {
            scheduler: Scheduler::new(),
            now: VirtualTime::ZERO,
            rng: StdRng::seed_from_u64(settings.seed),
            propagation_delay: settings.propagation_delay,
            max_jitter: settings.max_jitter,
            last_arrival: HashMap::new(),
            sent: 0,
        };

        let params = topology.params();
        let nodes = (0..params.num_nodes)
            .map(|id| RoutingNode::new(id, params, topology.node_costs(id), &mut link))
            .collect();

        info!(
            "Simulator ready: {} routers, {} links, {} initial packets",
            params.num_nodes,
            topology.links().len(),
            link.sent
        );

        Self {
            topology,
            nodes,
            link,
            max_events: settings.max_events,
            events_processed: 0,
            delivered: 0,
        }
    }

    /// Build from a scenario, with its link changes already scheduled.
    pub fn from_scenario(config: &ScenarioConfig) -> Result<Self> {
        let mut sim = Self::new(config.topology()?, &config.simulation);
        for (at, a, b, cost) in config.resolved_link_changes() {
            sim.schedule_link_change(VirtualTime::new(at), a, b, cost);
        }
        Ok(sim)
    }

    /// Queue a cost change for link `a`-`b`, applied to both ends at `at`.
    ///
    /// # Panics
    /// If `at` is earlier than [`Simulator::current_time`], or the link or
    /// cost is invalid.
    pub fn schedule_link_change(&mut self, at: VirtualTime, a: NodeId, b: NodeId, cost: Cost) {
        assert!(
            at >= self.link.now,
            "link change scheduled in the past: now={}, at={}",
            self.link.now,
            at
        );
        let params = self.topology.params();
        params.check_node(a);
        params.check_node(b);
        params.check_cost(cost);
        assert_ne!(a, b, "a link needs two distinct routers");
        self.link.scheduler.schedule(at, EventKind::LinkChange { a, b, cost });
    }

    /// Dispatch the next event. `None` once nothing is pending.
    pub fn step(&mut self) -> Option<Event> {
        let event = self.link.scheduler.pop_next()?;
        assert!(
            event.at >= self.link.now,
            "time went backward: now={}, event={}",
            self.link.now,
            event.at
        );
        self.link.now = event.at;
        self.events_processed += 1;

        match &event.kind {
            EventKind::Deliver(packet) => {
                self.delivered += 1;
                debug!("{} deliver {}", event.at, packet);
                let dest = packet.dest_id;
                self.nodes[dest].recv_update(packet.clone(), &mut self.link);
            }
            EventKind::LinkChange { a, b, cost } => {
                let (a, b, cost) = (*a, *b, *cost);
                info!(
                    "{} link {}-{} cost -> {}",
                    event.at,
                    a,
                    b,
                    self.topology.params().fmt_cost(cost)
                );
                self.topology.set_link(a, b, cost);
                self.nodes[a].update_link_cost(b, cost, &mut self.link);
                self.nodes[b].update_link_cost(a, cost, &mut self.link);
            }
        }

        Some(event)
    }

    /// Run until the network falls silent or the delivery budget is spent.
    pub fn run(&mut self) -> RunReport {
        let start_delivered = self.delivered;
        while self.delivered - start_delivered < self.max_events {
            if self.step().is_none() {
                break;
            }
        }

        let converged = self.link.scheduler.is_empty();
        if converged {
            info!(
                "Network quiescent at {} after {} deliveries",
                self.link.now, self.delivered
            );
        } else {
            warn!(
                "No quiescence after {} deliveries ({} packets still in flight); \
                 routing may be counting to infinity",
                self.delivered - start_delivered,
                self.link.scheduler.pending_deliveries()
            );
        }
        self.report(converged)
    }

    fn report(&self, converged: bool) -> RunReport {
        RunReport {
            events_processed: self.events_processed,
            packets_sent: self.link.sent,
            packets_delivered: self.delivered,
            final_time: self.link.now,
            converged,
            broadcasts: self.nodes.iter().map(RoutingNode::broadcasts).collect(),
        }
    }

    /// Compare every router's vector with Dijkstra over the current topology.
    pub fn verify(&self) -> Vec<Discrepancy> {
        let snapshots: Vec<NodeSnapshot> = self.nodes.iter().map(RoutingNode::snapshot).collect();
        verify_snapshots(&self.topology, &snapshots)
    }

    /// Clock query for status output.
    pub fn current_time(&self) -> VirtualTime {
        self.link.now
    }

    pub fn node(&self, id: NodeId) -> &RoutingNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[RoutingNode] {
        &self.nodes
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn pending_events(&self) -> usize {
        self.link.scheduler.len()
    }

    pub fn is_finished(&self) -> bool {
        self.link.scheduler.is_empty()
    }
}
