use serde::{Deserialize, Serialize};

/// Logical simulation clock. Advances only when the simulator dispatches an
/// event, never from wall-clock observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtualTime(u64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0);

    #[inline]
    pub fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// Time `delay` ticks later, saturating at the end of time.
    #[inline]
    pub fn plus(self, delay: u64) -> VirtualTime {
        VirtualTime(self.0.saturating_add(delay))
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}
