/// Connection-level tuning. Both peers must agree on `packet_type`,
/// `num_packet_types` and `protocol_id` for their wire formats to line up.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// The type tag this connection writes into (and accepts from) every
    /// packet.
    pub packet_type: u16,
    /// Size of the packet-type enumeration; bounds the tag's wire width.
    pub num_packet_types: u16,
    /// Byte budget for one outbound packet, channel data included.
    pub max_packet_size: usize,
    /// A written packet unacked after this many newer packets is declared
    /// lost and its channels notified.
    pub ack_window: u16,
    /// Ring capacity for sent-packet bookkeeping.
    pub sent_packets_buffer_size: usize,
    /// Ring capacity for received-packet bookkeeping; packets older than
    /// this window are discarded as stale.
    pub received_packets_buffer_size: usize,
    /// When set, written as a 32-bit preamble and checked on read; a
    /// mismatch discards the packet.
    pub protocol_id: Option<u32>,
}

impl ConnectionConfig {
    pub(crate) fn validate(&self) {
        assert!(self.num_packet_types > 0);
        assert!(self.packet_type < self.num_packet_types);
        assert!(self.max_packet_size >= 32);
        assert!(self.ack_window > 0);
        assert!(self.sent_packets_buffer_size >= usize::from(self.ack_window));
        assert!(self.sent_packets_buffer_size >= 256);
        assert!(self.received_packets_buffer_size >= 256);
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            packet_type: 0,
            num_packet_types: 1,
            max_packet_size: 1024,
            ack_window: 64,
            sent_packets_buffer_size: 256,
            received_packets_buffer_size: 256,
            protocol_id: None,
        }
    }
}
