//! # Tether Protocol
//! A connection-oriented reliability layer over an unreliable datagram
//! transport: sequenced, acked packets carrying reliable, in-order message
//! channels that multiplex small messages and arbitrarily large blocks.
//!
//! The host owns the socket and the tick loop; the core is single-threaded
//! and fully driven by [`Connection::update`], [`Connection::write_packet`]
//! and [`Connection::read_packet`].

mod connection;
mod constants;
mod messages;
mod sequence_buffer;
mod time;
mod types;
mod wrapping_number;

pub use tether_serde::{
    bits_required, de_block_bytes, de_ranged_int, de_raw_bytes, ser_block_bytes, ser_ranged_int,
    ser_raw_bytes, BitCounter, BitReader, BitWrite, BitWriter, Serde, SerdeErr,
};

pub use connection::{
    ack_manager::AckManager,
    connection::{Connection, ConnectionCounter},
    connection_config::ConnectionConfig,
    error::PacketReadError,
    packet_notifiable::PacketNotifiable,
    standard_header::StandardHeader,
};
pub use constants::MAX_SMALL_BLOCK_BYTES;
pub use messages::{
    block_message::BlockMessage,
    channels::{
        channel_config::ReliableChannelConfig,
        error::SendError,
        reliable_channel::{ChannelCounter, ReliableMessageChannel},
    },
    error::{MessageReadError, MessageRegistryError},
    message::{BoxedMessage, Message},
    message_kinds::{MessageKind, MessageKinds},
};
pub use time::TimeBase;
pub use types::{MessageId, PacketIndex};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, wrapping_diff};
