use std::fmt::Write;

use crate::network::{Discrepancy, RunReport, VirtualTime};
use crate::protocol::NodeSnapshot;
use crate::types::{Cost, RoutingParams};

const COL: usize = 6;

fn cell(params: &RoutingParams, cost: Cost) -> String {
    format!("{:>width$}", params.fmt_cost(cost), width = COL)
}

fn header(output: &mut String, n: usize) {
    write!(output, "{:>9} |", "dst").unwrap();
    for dest in 0..n {
        write!(output, "{:>width$}", dest, width = COL).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "{}", "-".repeat(11 + COL * n)).unwrap();
}

/// Text dump of one router's tables: what each neighbor last reported, then
/// our link costs, our vector and our next hops.
pub fn render_node(snapshot: &NodeSnapshot, now: Option<VirtualTime>) -> String {
    let params = &snapshot.params;
    let n = params.num_nodes;
    let mut output = String::new();

    match now {
        Some(t) => writeln!(output, "Current table for {} at time {}", snapshot.id, t).unwrap(),
        None => writeln!(output, "Current table for {}", snapshot.id).unwrap(),
    }

    writeln!(output, "\nDistance table:").unwrap();
    header(&mut output, n);
    let mut any = false;
    for nbr in snapshot.neighbors() {
        any = true;
        write!(output, "{:>9} |", format!("nbr {}", nbr)).unwrap();
        for &cost in &snapshot.distance[nbr] {
            output.push_str(&cell(params, cost));
        }
        writeln!(output).unwrap();
    }
    if !any {
        writeln!(output, "No neighbors").unwrap();
    }

    writeln!(output, "\nOur distance vector and routes:").unwrap();
    header(&mut output, n);

    write!(output, "{:>9} |", "cost").unwrap();
    for &cost in &snapshot.costs {
        output.push_str(&cell(params, cost));
    }
    writeln!(output).unwrap();

    write!(output, "{:>9} |", "distance").unwrap();
    for &cost in snapshot.distance_vector() {
        output.push_str(&cell(params, cost));
    }
    writeln!(output).unwrap();

    let mut hops = vec!["-".to_string(); n];
    for (dest, hop) in snapshot.routes.iter() {
        hops[dest] = hop.to_string();
    }
    write!(output, "{:>9} |", "route").unwrap();
    for hop in &hops {
        write!(output, "{:>width$}", hop, width = COL).unwrap();
    }
    writeln!(output).unwrap();

    output
}

pub fn render_report(report: &RunReport) -> String {
    let mut output = String::new();
    writeln!(output, "Run summary:").unwrap();
    writeln!(output, "{}", "=".repeat(40)).unwrap();
    writeln!(output, "{:<20} {}", "Converged", if report.converged { "YES" } else { "NO" }).unwrap();
    writeln!(output, "{:<20} {}", "Final time", report.final_time).unwrap();
    writeln!(output, "{:<20} {}", "Events", report.events_processed).unwrap();
    writeln!(output, "{:<20} {}", "Packets sent", report.packets_sent).unwrap();
    writeln!(output, "{:<20} {}", "Packets delivered", report.packets_delivered).unwrap();
    for (id, count) in report.broadcasts.iter().enumerate() {
        writeln!(output, "{:<20} {}", format!("Broadcasts by {}", id), count).unwrap();
    }
    output
}

pub fn render_discrepancies(found: &[Discrepancy], params: &RoutingParams) -> String {
    let mut output = String::new();
    if found.is_empty() {
        writeln!(output, "All routers agree with the shortest-path reference").unwrap();
        return output;
    }

    writeln!(output, "{} discrepancies:", found.len()).unwrap();
    for d in found {
        match d {
            Discrepancy::Cost { node, dest, expected, actual } => writeln!(
                output,
                "  router {} -> {}: cost {} (expected {})",
                node,
                dest,
                params.fmt_cost(*actual),
                params.fmt_cost(*expected)
            )
            .unwrap(),
            Discrepancy::Route { node, dest, next_hop, reference_hop } => writeln!(
                output,
                "  router {} -> {}: next hop {:?} does not achieve the advertised cost (shortest path leaves via {:?})",
                node, dest, next_hop, reference_hop
            )
            .unwrap(),
        }
    }
    output
}
