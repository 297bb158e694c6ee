use tether_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::types::PacketIndex;

/// The reliability header carried by every connection packet: this
/// packet's sequence, plus cumulative acknowledgement of the peer's
/// packets (`ack` is the newest sequence seen; bit `k` of `ack_bits`
/// records receipt of `ack - 1 - k`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardHeader {
    pub sequence: PacketIndex,
    pub ack: PacketIndex,
    pub ack_bits: u32,
}

impl Serde for StandardHeader {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.sequence.ser(writer);
        self.ack.ser(writer);
        self.ack_bits.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sequence: PacketIndex::de(reader)?,
            ack: PacketIndex::de(reader)?,
            ack_bits: u32::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        64
    }
}
