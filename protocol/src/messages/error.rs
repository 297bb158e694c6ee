use thiserror::Error;

use tether_serde::SerdeErr;

/// Errors raised while building a [`MessageKinds`] registry.
///
/// [`MessageKinds`]: crate::messages::message_kinds::MessageKinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageRegistryError {
    #[error("message kind {kind} is already registered")]
    DuplicateKind { kind: u16 },

    #[error("message kind 0 is reserved for block messages")]
    ReservedKind,

    #[error("registry is locked, no further registrations allowed")]
    Locked,
}

/// Errors raised while decoding a message from the wire. Any occurrence
/// discards the enclosing packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageReadError {
    #[error("no reader registered for message kind {kind}")]
    UnknownKind { kind: u16 },

    #[error("message payload decode failure")]
    Serde(#[from] SerdeErr),
}
