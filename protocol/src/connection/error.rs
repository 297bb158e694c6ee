use thiserror::Error;

use tether_serde::SerdeErr;

use crate::messages::error::MessageReadError;

/// Why an inbound packet was not applied. Stale and duplicate sequences
/// count as discards; everything else counts as a read failure. Neither is
/// surfaced to the caller beyond counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketReadError {
    #[error("packet sequence {sequence} is older than the received window")]
    Stale { sequence: u16 },

    #[error("packet sequence {sequence} was already received")]
    Duplicate { sequence: u16 },

    #[error("protocol id mismatch")]
    ProtocolIdMismatch,

    #[error("unexpected packet type {packet_type}")]
    UnknownPacketType { packet_type: u16 },

    #[error("message decode failure: {0}")]
    Message(#[from] MessageReadError),

    #[error("packet decode failure")]
    Serde(#[from] SerdeErr),
}

impl PacketReadError {
    /// Stale-or-duplicate is tallied separately from malformed input.
    pub fn is_discard(&self) -> bool {
        matches!(
            self,
            PacketReadError::Stale { .. } | PacketReadError::Duplicate { .. }
        )
    }
}
