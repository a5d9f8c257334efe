pub mod event;
pub mod simulator;
pub mod time;
pub mod topology;

pub use event::{Event, EventKind, Scheduler};
pub use simulator::{verify_snapshots, Discrepancy, RunReport, Simulator};
pub use time::VirtualTime;
pub use topology::{Link, Topology};
