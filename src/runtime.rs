//! Concurrent deployment: every router is its own tokio task.
//!
//! A router's state is touched only by its task. Everything reaching it,
//! vectors from peers as well as link-cost changes from the controller,
//! goes through a single inbox, so handlers never interleave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::network::{verify_snapshots, Discrepancy, Topology};
use crate::protocol::{NodeSnapshot, RouterPacket, RoutingNode};
use crate::types::{Cost, NodeId, RoutingParams};

#[derive(Debug)]
pub enum NodeCommand {
    Update(RouterPacket),
    LinkCost { dest: NodeId, cost: Cost },
    Snapshot(oneshot::Sender<NodeSnapshot>),
    Shutdown,
}

type Inbox = mpsc::UnboundedSender<NodeCommand>;

/// Count of queued vectors and link changes not yet fully handled.
/// Reaching zero means the network has gone quiet.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_one();
        }
    }

    fn current(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

fn forward(peers: &[Inbox], in_flight: &InFlight, packet: RouterPacket) {
    let dest = packet.dest_id;
    in_flight.start();
    if peers[dest].send(NodeCommand::Update(packet)).is_err() {
        warn!(router = dest, "inbox closed, dropping vector");
        in_flight.finish();
    }
}

async fn run_node(
    mut node: RoutingNode,
    mut inbox: mpsc::UnboundedReceiver<NodeCommand>,
    peers: Arc<Vec<Inbox>>,
    in_flight: Arc<InFlight>,
) -> RoutingNode {
    let id = node.id();
    debug!(router = id, "task started");

    while let Some(command) = inbox.recv().await {
        let mut outbox = Vec::new();
        match command {
            NodeCommand::Update(packet) => node.recv_update(packet, &mut outbox),
            NodeCommand::LinkCost { dest, cost } => node.update_link_cost(dest, cost, &mut outbox),
            NodeCommand::Snapshot(reply) => {
                let _ = reply.send(node.snapshot());
                continue;
            }
            NodeCommand::Shutdown => break,
        }

        // Children are counted before the parent is released.
        for packet in outbox {
            forward(&peers, &in_flight, packet);
        }
        in_flight.finish();
    }

    debug!(router = id, broadcasts = node.broadcasts(), "task stopped");
    node
}

/// A running network of router tasks plus the controller's view of the
/// physical links.
pub struct AsyncNetwork {
    topology: Topology,
    peers: Arc<Vec<Inbox>>,
    in_flight: Arc<InFlight>,
    tasks: Vec<JoinHandle<RoutingNode>>,
}

impl AsyncNetwork {
    /// Build every router, spawn its task and release the initial
    /// announcements. Must be called from within a tokio runtime.
    pub fn start(topology: Topology) -> Self {
        let params: RoutingParams = topology.params();
        let n = params.num_nodes;

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..n).map(|_| mpsc::unbounded_channel()).unzip();
        let peers = Arc::new(senders);
        let in_flight = Arc::new(InFlight::default());

        let mut announcements = Vec::new();
        let nodes: Vec<RoutingNode> = (0..n)
            .map(|id| RoutingNode::new(id, params, topology.node_costs(id), &mut announcements))
            .collect();

        let tasks = nodes
            .into_iter()
            .zip(receivers)
            .map(|(node, inbox)| {
                tokio::spawn(run_node(node, inbox, peers.clone(), in_flight.clone()))
            })
            .collect();

        info!(routers = n, packets = announcements.len(), "network started");
        for packet in announcements {
            forward(&peers, &in_flight, packet);
        }

        Self {
            topology,
            peers,
            in_flight,
            tasks,
        }
    }

    /// Change link `a`-`b` at both ends.
    pub fn change_link(&mut self, a: NodeId, b: NodeId, cost: Cost) -> Result<()> {
        let params = self.topology.params();
        if a >= params.num_nodes || b >= params.num_nodes || a == b {
            bail!("invalid link {}-{}", a, b);
        }
        if cost > params.infinity {
            bail!("cost {} exceeds infinity {}", cost, params.infinity);
        }

        info!(a, b, cost, "link change");
        self.topology.set_link(a, b, cost);
        for (from, to) in [(a, b), (b, a)] {
            self.in_flight.start();
            if self.peers[from].send(NodeCommand::LinkCost { dest: to, cost }).is_err() {
                self.in_flight.finish();
                bail!("router {} is not running", from);
            }
        }
        Ok(())
    }

    /// Wait until no vector or link change is left to process.
    pub async fn wait_quiescent(&self, limit: Duration) -> Result<()> {
        let in_flight = self.in_flight.clone();
        let quiet = async move {
            while in_flight.current() != 0 {
                in_flight.idle.notified().await;
            }
        };

        tokio::time::timeout(limit, quiet).await.map_err(|_| {
            anyhow!(
                "no quiescence within {:?} ({} messages in flight); routing may be counting to infinity",
                limit,
                self.in_flight.current()
            )
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub async fn snapshot(&self, id: NodeId) -> Result<NodeSnapshot> {
        let inbox = self
            .peers
            .get(id)
            .ok_or_else(|| anyhow!("no router {}", id))?;
        let (tx, rx) = oneshot::channel();
        inbox
            .send(NodeCommand::Snapshot(tx))
            .map_err(|_| anyhow!("router {} is not running", id))?;
        rx.await.with_context(|| format!("router {} dropped the snapshot request", id))
    }

    pub async fn snapshots(&self) -> Result<Vec<NodeSnapshot>> {
        let mut out = Vec::with_capacity(self.peers.len());
        for id in 0..self.peers.len() {
            out.push(self.snapshot(id).await?);
        }
        Ok(out)
    }

    pub async fn verify(&self) -> Result<Vec<Discrepancy>> {
        let snapshots = self.snapshots().await?;
        Ok(verify_snapshots(&self.topology, &snapshots))
    }

    /// Stop every task and hand back the final routers.
    pub async fn shutdown(self) -> Result<Vec<RoutingNode>> {
        for inbox in self.peers.iter() {
            let _ = inbox.send(NodeCommand::Shutdown);
        }

        let mut nodes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            nodes.push(task.await.context("router task panicked")?);
        }
        info!("network stopped");
        Ok(nodes)
    }
}
