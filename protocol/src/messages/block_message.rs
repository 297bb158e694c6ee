use std::any::Any;

use tether_serde::{de_block_bytes, ser_block_bytes, BitReader, BitWrite, SerdeErr};

use crate::{
    constants::MAX_SMALL_BLOCK_BYTES,
    messages::{message::Message, message_kinds::MessageKind},
};

/// A message whose payload is an owned byte array. Blocks small enough to
/// fit inline travel as a single message of kind 0; larger blocks are
/// fragmented by the channel and a `BlockMessage` is synthesized on the
/// receive side once reassembly completes.
pub struct BlockMessage {
    bytes: Box<[u8]>,
}

impl BlockMessage {
    pub fn new(bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.is_empty());
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let bytes = de_block_bytes(reader, MAX_SMALL_BLOCK_BYTES)?;
        Ok(Self::new(bytes))
    }
}

impl Message for BlockMessage {
    fn kind(&self) -> MessageKind {
        MessageKind::BLOCK
    }

    fn name(&self) -> &'static str {
        "BlockMessage"
    }

    fn ser(&self, writer: &mut dyn BitWrite) {
        ser_block_bytes(&self.bytes, MAX_SMALL_BLOCK_BYTES, writer);
    }

    fn to_boxed_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
