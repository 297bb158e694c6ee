use crate::types::PacketIndex;

/// Receives per-packet delivery verdicts inferred by the ack manager.
/// Every written packet is eventually reported exactly once: delivered
/// when an ack covers it, dropped when it ages out of the ack window.
pub trait PacketNotifiable {
    fn notify_packet_delivered(&mut self, packet_index: PacketIndex);

    fn notify_packet_dropped(&mut self, packet_index: PacketIndex);
}
