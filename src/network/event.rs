use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::protocol::RouterPacket;
use crate::types::{Cost, NodeId};
use super::time::VirtualTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Hand a vector to its destination router.
    Deliver(RouterPacket),
    /// Change the cost of link `a`-`b` at both ends.
    LinkChange { a: NodeId, b: NodeId, cost: Cost },
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Deliver(packet) => write!(f, "Deliver({})", packet),
            EventKind::LinkChange { a, b, cost } => write!(f, "LinkChange({}-{} = {})", a, b, cost),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub at: VirtualTime,
    /// Insertion counter; breaks ties so equal-time events run in schedule order.
    pub seq: u64,
    pub kind: EventKind,
}

/// Smallest `(at, seq)` first: `BinaryHeap` is a max-heap, so compare reversed.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic event queue keyed by `(time, insertion order)`.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Event>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: VirtualTime, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event { at, seq, kind });
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of packets still in flight.
    pub fn pending_deliveries(&self) -> usize {
        self.queue
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Deliver(_)))
            .count()
    }
}
