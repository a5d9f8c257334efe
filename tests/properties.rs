use proptest::prelude::*;

use dv_router::algorithms::all_pairs;
use dv_router::{Cost, RoutingParams, SimulationConfig, Simulator, Topology, VirtualTime};

const INF: Cost = 1000;

#[derive(Debug, Clone)]
struct Network {
    n: usize,
    links: Vec<(usize, usize, Cost)>,
}

impl Network {
    fn topology(&self) -> Topology {
        let mut topo = Topology::new(RoutingParams::new(self.n, INF));
        for &(a, b, cost) in &self.links {
            topo.set_link(a, b, cost);
        }
        topo
    }
}

/// Connected graphs: a random spanning tree plus a few extra links, all
/// costs at least 1.
fn network() -> impl Strategy<Value = Network> {
    (2usize..7).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((any::<prop::sample::Index>(), 1u32..20), n - 1),
            prop::collection::vec((0..n, 0..n, 1u32..20), 0..6),
        )
            .prop_map(|(n, tree, extra)| {
                let mut links = Vec::new();
                for (child, (parent, cost)) in (1..n).zip(tree) {
                    links.push((parent.index(child), child, cost));
                }
                links.extend(extra.into_iter().filter(|(a, b, _)| a != b));
                Network { n, links }
            })
    })
}

fn settings(seed: u64, jitter: u64) -> SimulationConfig {
    SimulationConfig {
        propagation_delay: 1,
        max_jitter: jitter,
        seed,
        max_events: 200_000,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn converges_to_shortest_paths(net in network(), seed in any::<u64>(), jitter in 0u64..5) {
        let topo = net.topology();
        let truth = all_pairs(&topo);
        let mut sim = Simulator::new(topo, &settings(seed, jitter));
        let report = sim.run();

        prop_assert!(report.converged);
        prop_assert!(sim.verify().is_empty());
        for node in sim.nodes() {
            prop_assert_eq!(node.distance_vector(), truth[node.id()].as_slice());
        }
    }

    #[test]
    fn routes_match_advertised_costs(net in network(), seed in any::<u64>()) {
        let mut sim = Simulator::new(net.topology(), &settings(seed, 3));
        prop_assert!(sim.run().converged);

        let params = sim.topology().params();
        for node in sim.nodes() {
            prop_assert_eq!(node.distance_vector()[node.id()], 0);
            for dest in 0..net.n {
                if dest == node.id() {
                    continue;
                }
                match node.next_hop(dest) {
                    Some(hop) => {
                        prop_assert!(node.is_neighbor(hop));
                        let via = params.add(node.costs()[hop], node.distance_table()[hop][dest]);
                        prop_assert_eq!(via, node.distance_vector()[dest]);
                    }
                    None => prop_assert!(params.is_infinite(node.distance_vector()[dest])),
                }
            }
        }
    }

    #[test]
    fn advertisements_poison_the_next_hop(net in network(), seed in any::<u64>()) {
        let mut sim = Simulator::new(net.topology(), &settings(seed, 2));
        prop_assert!(sim.run().converged);

        for node in sim.nodes() {
            for nbr in node.neighbors() {
                let adv = node.advertisement_for(nbr);
                prop_assert_eq!(adv.source_id, node.id());
                prop_assert_eq!(adv.dest_id, nbr);
                for dest in 0..net.n {
                    if dest != nbr && node.next_hop(dest) == Some(nbr) {
                        prop_assert_eq!(adv.mincost[dest], INF);
                    }
                }
            }
        }
    }

    #[test]
    fn decreases_never_raise_costs(
        net in network(),
        seed in any::<u64>(),
        cuts in prop::collection::vec((any::<prop::sample::Index>(), 1u32..20, 1u64..30), 1..4),
    ) {
        let mut topo = net.topology();
        let links = topo.links();
        let mut sim = Simulator::new(topo.clone(), &settings(seed, 4));

        let mut cuts = cuts;
        cuts.sort_by_key(|&(_, _, at)| at);
        for (pick, amount, at) in cuts {
            let link = links[pick.index(links.len())];
            let current = topo.link_cost(link.a, link.b);
            let lowered = current.saturating_sub(amount).max(1);
            topo.set_link(link.a, link.b, lowered);
            sim.schedule_link_change(VirtualTime::new(at), link.a, link.b, lowered);
        }

        let mut previous: Vec<Vec<Cost>> =
            sim.nodes().iter().map(|n| n.distance_vector().to_vec()).collect();
        while sim.step().is_some() {
            for node in sim.nodes() {
                let id = node.id();
                for (dest, &cost) in node.distance_vector().iter().enumerate() {
                    prop_assert!(cost <= previous[id][dest]);
                }
                previous[id] = node.distance_vector().to_vec();
            }
        }
        prop_assert!(sim.verify().is_empty());
    }
}
