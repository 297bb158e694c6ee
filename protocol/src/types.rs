/// Identifies a packet within a connection. Wraps; compare with
/// [`sequence_greater_than`](crate::sequence_greater_than).
pub type PacketIndex = u16;

/// Identifies a message within a channel, assigned in send order.
/// Independent of packet sequencing; wraps the same way.
pub type MessageId = u16;
