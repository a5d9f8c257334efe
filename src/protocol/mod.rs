pub mod messages;
pub mod node;
pub mod routing_table;
pub mod sink;

pub use messages::*;
pub use node::*;
pub use routing_table::*;
pub use sink::*;
