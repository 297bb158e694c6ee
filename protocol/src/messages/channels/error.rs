use thiserror::Error;

/// Errors surfaced to the caller by the channel send API. Everything else
/// the channel recovers from internally and reports through counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The slot for the next message id is still occupied by an un-acked
    /// message. Retry after the peer catches up.
    #[error("send queue is full")]
    SendQueueFull,

    /// The block exceeds the channel's configured maximum.
    #[error("block of {size} bytes exceeds the maximum block size of {max} bytes")]
    BlockTooLarge { size: usize, max: usize },
}
