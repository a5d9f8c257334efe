pub mod dijkstra;

pub use dijkstra::{all_pairs, calculate_shortest_paths, ShortestPaths};
