use crate::constants::MAX_SMALL_BLOCK_BYTES;

/// Per-channel tuning for a reliable message channel.
#[derive(Clone, Debug)]
pub struct ReliableChannelConfig {
    /// Minimum interval (seconds) between retransmissions of the same
    /// message or fragment.
    pub resend_rate: f64,
    /// Capacity of the send queue ring, keyed by message id.
    pub send_queue_size: usize,
    /// Capacity of the receive queue ring. Messages arriving further than
    /// this ahead of the next expected id are dropped as early.
    pub receive_queue_size: usize,
    /// Cap on the number of messages packed into one packet; also bounds
    /// the wire width of the per-packet message count.
    pub max_messages_per_packet: usize,
    /// Blocks up to this many bytes are sent inline as a single message;
    /// larger blocks are fragmented. Must not exceed
    /// [`MAX_SMALL_BLOCK_BYTES`].
    pub max_small_block_size: usize,
    /// Fragment payload size in bytes. Every fragment but the last carries
    /// exactly this many.
    pub fragment_size: usize,
    /// Largest block accepted by `send_block`.
    pub max_block_size: usize,
}

impl ReliableChannelConfig {
    /// Upper bound on fragments per block; bounds the wire width of the
    /// fragment count field.
    pub fn max_fragments(&self) -> usize {
        (self.max_block_size + self.fragment_size - 1) / self.fragment_size
    }

    pub(crate) fn validate(&self) {
        assert!(self.resend_rate > 0.0);
        assert!(self.send_queue_size > 0 && self.send_queue_size < 32768);
        assert!(self.receive_queue_size > 0 && self.receive_queue_size < 32768);
        assert!(self.max_messages_per_packet > 0);
        assert!(self.max_small_block_size > 0);
        assert!(self.max_small_block_size <= MAX_SMALL_BLOCK_BYTES);
        assert!(self.fragment_size > 1);
        assert!(self.max_block_size >= self.max_small_block_size);
    }
}

impl Default for ReliableChannelConfig {
    fn default() -> Self {
        Self {
            resend_rate: 0.1,
            send_queue_size: 1024,
            receive_queue_size: 256,
            max_messages_per_packet: 32,
            max_small_block_size: 256,
            fragment_size: 64,
            max_block_size: 256 * 1024,
        }
    }
}
