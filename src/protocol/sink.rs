use super::messages::RouterPacket;

/// Outbound side of a routing node.
///
/// A node calls `deliver` once per neighbor per broadcast. Ordering and
/// timing are entirely up to the implementation; it must not modify the
/// packet after handoff.
pub trait PacketSink {
    fn deliver(&mut self, packet: RouterPacket);
}

/// Collects packets in send order. Handy for tests and for the async runtime,
/// which drains the buffer into neighbor inboxes after each event.
impl PacketSink for Vec<RouterPacket> {
    fn deliver(&mut self, packet: RouterPacket) {
        self.push(packet);
    }
}

