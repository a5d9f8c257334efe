use dv_router::network::{EventKind, Simulator, Topology, VirtualTime};
use dv_router::{Cost, NodeId, RouterPacket, RoutingNode, RoutingParams, ScenarioConfig, SimulationConfig};

const INF: Cost = 999;

fn scenario_path(name: &str) -> String {
    format!("{}/scenarios/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn packet_to(out: &[RouterPacket], dest: NodeId) -> RouterPacket {
    out.iter()
        .find(|p| p.dest_id == dest)
        .cloned()
        .expect("no packet for destination")
}

/// A(0) - B(1) - C(2), links of cost 1, no direct A-C link.
fn build_line() -> (Vec<RoutingNode>, Vec<Vec<RouterPacket>>) {
    let params = RoutingParams::new(3, INF);
    let costs = [vec![0, 1, INF], vec![1, 0, 1], vec![INF, 1, 0]];
    let mut outs = vec![Vec::new(), Vec::new(), Vec::new()];
    let nodes = (0..3)
        .map(|id| RoutingNode::new(id, params, &costs[id], &mut outs[id]))
        .collect();
    (nodes, outs)
}

#[test]
fn test_line_walkthrough() {
    let (mut nodes, outs) = build_line();

    // Freshly built: A only knows its direct link.
    assert_eq!(nodes[0].distance_vector(), &[0, 1, INF]);
    let b_initial = packet_to(&outs[1], 0);
    assert_eq!(b_initial.mincost, vec![1, 0, 1]);

    // A learns C through B and announces it.
    let mut a_out = Vec::new();
    nodes[0].recv_update(b_initial, &mut a_out);
    assert_eq!(nodes[0].distance_vector(), &[0, 1, 2]);
    assert_eq!(nodes[0].next_hop(2), Some(1));
    assert_eq!(a_out.len(), 1);

    // What A tells B hides C, since A reaches C through B.
    let a_to_b = packet_to(&a_out, 1);
    assert_eq!(a_to_b.mincost, vec![0, 1, INF]);

    // B already has a cheaper direct path to C and stays silent.
    let mut b_out = Vec::new();
    nodes[1].recv_update(a_to_b.clone(), &mut b_out);
    assert!(b_out.is_empty());
    assert_eq!(nodes[1].distance_vector(), &[1, 0, 1]);

    // Even unpoisoned, A's cost to C (2) would not beat B's direct 1.
    let mut b_out = Vec::new();
    nodes[1].recv_update(RouterPacket::new(0, 1, vec![0, 1, 2]), &mut b_out);
    assert!(b_out.is_empty());

    // A-B rises to 10: both entries through B move.
    let mut a_out = Vec::new();
    nodes[0].update_link_cost(1, 10, &mut a_out);
    assert_eq!(nodes[0].distance_vector(), &[0, 10, 11]);
    assert_eq!(nodes[0].distance_table()[1][1], 0);
    assert_eq!(packet_to(&a_out, 1).mincost, vec![0, 10, INF]);
}

#[test]
fn test_self_cost_stays_zero_throughout_run() {
    let config = ScenarioConfig::load(scenario_path("ring5.json")).unwrap();
    let mut sim = Simulator::from_scenario(&config).unwrap();
    while sim.step().is_some() {
        for node in sim.nodes() {
            assert_eq!(node.distance_vector()[node.id()], 0);
        }
    }
    assert!(sim.verify().is_empty());
}

#[test]
fn test_lab_scenario_reconverges_after_cost_increase() {
    let mut sim = Simulator::from_scenario(&ScenarioConfig::default()).unwrap();
    let report = sim.run();

    assert!(report.converged);
    assert!(report.final_time >= VirtualTime::new(40));
    assert!(sim.verify().is_empty());

    assert_eq!(sim.node(0).distance_vector(), &[0, 51, 1]);
    assert_eq!(sim.node(1).distance_vector(), &[51, 0, 50]);
    assert_eq!(sim.node(2).distance_vector(), &[1, 50, 0]);
    assert_eq!(sim.node(0).next_hop(1), Some(2));
    assert_eq!(sim.node(1).next_hop(0), Some(2));
    assert_eq!(sim.node(2).next_hop(1), Some(1));
}

#[test]
fn test_lab_scenario_before_link_change() {
    let mut config = ScenarioConfig::default();
    config.link_changes.clear();
    let mut sim = Simulator::from_scenario(&config).unwrap();
    assert!(sim.run().converged);

    assert_eq!(sim.node(0).distance_vector(), &[0, 4, 1]);
    assert_eq!(sim.node(1).distance_vector(), &[4, 0, 5]);
    assert_eq!(sim.node(2).distance_vector(), &[1, 5, 0]);
    assert_eq!(sim.node(1).next_hop(2), Some(0));
}

#[test]
fn test_converged_network_poisons_routes_back_to_next_hop() {
    let config = ScenarioConfig::load(scenario_path("ring5.json")).unwrap();
    let mut sim = Simulator::from_scenario(&config).unwrap();
    assert!(sim.run().converged);

    for node in sim.nodes() {
        for nbr in node.neighbors() {
            let adv = node.advertisement_for(nbr);
            for dest in 0..5 {
                if dest != nbr && node.next_hop(dest) == Some(nbr) {
                    assert_eq!(adv.mincost[dest], config.infinity);
                } else {
                    assert_eq!(adv.mincost[dest], node.distance_vector()[dest]);
                }
            }
        }
    }
}

#[test]
fn test_stub_failure_counts_up_to_infinity_then_settles() {
    let config = ScenarioConfig::load(scenario_path("count_to_infinity.json")).unwrap();
    let mut sim = Simulator::from_scenario(&config).unwrap();
    let report = sim.run();

    assert!(report.converged);
    assert!(sim.verify().is_empty());
    for id in 0..3 {
        assert_eq!(sim.node(id).distance_vector()[3], config.infinity);
        assert_eq!(sim.node(id).next_hop(3), None);
    }
    assert_eq!(sim.node(3).distance_vector(), &[16, 16, 16, 0]);
    assert!(sim.node(3).routes().is_empty());
}

#[test]
fn test_partition_and_heal() {
    let params = RoutingParams::new(4, INF);
    let topo = Topology::from_matrix(
        params,
        vec![
            vec![0, 2, INF, INF],
            vec![2, 0, 3, INF],
            vec![INF, 3, 0, 1],
            vec![INF, INF, 1, 0],
        ],
    )
    .unwrap();
    let settings = SimulationConfig { max_jitter: 2, seed: 5, ..SimulationConfig::default() };
    let mut sim = Simulator::new(topo, &settings);
    sim.schedule_link_change(VirtualTime::new(50), 1, 2, INF);
    assert!(sim.run().converged);

    assert_eq!(sim.node(0).distance_vector(), &[0, 2, INF, INF]);
    assert_eq!(sim.node(3).distance_vector(), &[INF, INF, 1, 0]);
    assert!(sim.verify().is_empty());

    // A new link 0-3 joins the halves again.
    let now = sim.current_time();
    sim.schedule_link_change(now.plus(10), 0, 3, 4);
    assert!(sim.run().converged);
    assert_eq!(sim.node(1).distance_vector(), &[2, 0, 7, 6]);
    assert_eq!(sim.node(2).next_hop(1), Some(3));
    assert!(sim.verify().is_empty());
}

#[test]
fn test_decreases_never_raise_any_cost() {
    let config = ScenarioConfig::load(scenario_path("ring5.json")).unwrap();
    let topo = config.topology().unwrap();
    let settings = SimulationConfig { max_jitter: 6, seed: 99, ..SimulationConfig::default() };
    let mut sim = Simulator::new(topo, &settings);
    sim.schedule_link_change(VirtualTime::new(3), 0, 4, 1);
    sim.schedule_link_change(VirtualTime::new(9), 3, 4, 2);
    sim.schedule_link_change(VirtualTime::new(15), 1, 2, 1);

    let mut previous: Vec<Vec<Cost>> = sim.nodes().iter().map(|n| n.distance_vector().to_vec()).collect();
    while let Some(event) = sim.step() {
        for node in sim.nodes() {
            let id = node.id();
            for (dest, &cost) in node.distance_vector().iter().enumerate() {
                assert!(
                    cost <= previous[id][dest],
                    "router {} cost to {} rose from {} to {} at {}",
                    id, dest, previous[id][dest], cost, event.kind
                );
            }
            previous[id] = node.distance_vector().to_vec();
        }
    }
    assert!(sim.verify().is_empty());
}

#[test]
fn test_deliveries_only_between_neighbors() {
    let config = ScenarioConfig::load(scenario_path("lab3.json")).unwrap();
    assert_eq!(config, ScenarioConfig::default());

    let mut sim = Simulator::from_scenario(&config).unwrap();
    while let Some(event) = sim.step() {
        if let EventKind::Deliver(packet) = &event.kind {
            assert_ne!(packet.source_id, packet.dest_id);
            assert_eq!(packet.mincost.len(), 3);
            assert_eq!(packet.mincost[packet.source_id], 0);
        }
    }
    assert!(sim.is_finished());
}

#[test]
fn test_same_seed_same_run() {
    let config = ScenarioConfig::load(scenario_path("ring5.json")).unwrap();
    let mut a = Simulator::from_scenario(&config).unwrap();
    let mut b = Simulator::from_scenario(&config).unwrap();
    assert_eq!(a.run(), b.run());
}
