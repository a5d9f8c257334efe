//! Distance-vector routing with split horizon and poison reverse.
//!
//! [`protocol::RoutingNode`] is a single router: it knows its direct link
//! costs, keeps the vectors its neighbors advertise, and relaxes its own
//! vector Bellman-Ford style whenever either changes. Around it:
//!
//! - [`network::Simulator`]: deterministic discrete-event driver for a
//!   whole network, with delivery delays and scheduled link changes;
//! - [`runtime::AsyncNetwork`]: the same routers as concurrent tokio tasks;
//! - [`algorithms::dijkstra`]: global shortest paths to check results against.
//!
//! Poison reverse stops two-node loops only. Longer loops can still count
//! to infinity after a link failure; the run then ends once costs reach the
//! configured infinity sentinel.

pub mod algorithms;
pub mod config;
pub mod display;
pub mod network;
pub mod protocol;
pub mod runtime;
pub mod types;

pub use config::{LinkChangeConfig, ScenarioConfig, SimulationConfig};
pub use network::{RunReport, Simulator, Topology, VirtualTime};
pub use protocol::{NodeSnapshot, PacketSink, RouterPacket, RoutingNode, RoutingTable};
pub use types::{Cost, NodeId, RoutingParams, DEFAULT_INFINITY};
