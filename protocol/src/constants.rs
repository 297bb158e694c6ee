/// Upper bound on the byte size of a block sent inline as a single
/// message. This caps the wire width of the inline size field, so the
/// format does not depend on per-channel configuration; a channel's
/// `max_small_block_size` must not exceed it.
pub const MAX_SMALL_BLOCK_BYTES: usize = 4096;
