use std::collections::HashMap;

use tether_serde::{bits_required, de_ranged_int, ser_ranged_int, BitReader, BitWrite, SerdeErr};

use crate::messages::{
    block_message::BlockMessage,
    error::{MessageReadError, MessageRegistryError},
    message::BoxedMessage,
};

/// Numeric message type tag, stable on the wire. Both peers must register
/// the same tags for the formats to interoperate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKind(pub u16);

impl MessageKind {
    /// Kind 0 is reserved for block messages.
    pub const BLOCK: MessageKind = MessageKind(0);
}

type MessageReader = Box<dyn Fn(&mut BitReader) -> Result<BoxedMessage, SerdeErr>>;

/// Registry mapping a kind tag to a reader producing a fresh message of
/// that kind. Used symmetrically: the writer encodes the tag at the width
/// the registry implies, the reader decodes the tag and dispatches.
/// Sealed with [`lock`](Self::lock); no registrations after that.
pub struct MessageKinds {
    readers: HashMap<u16, MessageReader>,
    max_kind: u16,
    locked: bool,
}

impl MessageKinds {
    /// Creates a registry with the block-message reader pre-registered
    /// under the reserved kind 0.
    pub fn new() -> Self {
        let mut readers = HashMap::new();
        readers.insert(
            0,
            Box::new(|reader: &mut BitReader| {
                BlockMessage::de(reader).map(|message| Box::new(message) as BoxedMessage)
            }) as MessageReader,
        );

        Self {
            readers,
            max_kind: 0,
            locked: false,
        }
    }

    /// Registers a reader under `kind`. Fails on the reserved kind, a
    /// duplicate, or a locked registry.
    pub fn register<F>(&mut self, kind: MessageKind, reader: F) -> Result<(), MessageRegistryError>
    where
        F: Fn(&mut BitReader) -> Result<BoxedMessage, SerdeErr> + 'static,
    {
        if self.locked {
            return Err(MessageRegistryError::Locked);
        }
        if kind == MessageKind::BLOCK {
            return Err(MessageRegistryError::ReservedKind);
        }
        if self.readers.contains_key(&kind.0) {
            return Err(MessageRegistryError::DuplicateKind { kind: kind.0 });
        }

        self.readers.insert(kind.0, Box::new(reader));
        self.max_kind = self.max_kind.max(kind.0);
        Ok(())
    }

    /// Seals the registry. Idempotent.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn tag_max(&self) -> i32 {
        // a lone block registration still needs a 1-bit tag
        i32::from(self.max_kind.max(1))
    }

    /// Wire width of a kind tag, for packet budgeting.
    pub fn tag_bit_length(&self) -> u32 {
        bits_required(0, self.tag_max())
    }

    pub fn ser_kind(&self, kind: MessageKind, writer: &mut dyn BitWrite) {
        debug_assert!(self.locked);
        ser_ranged_int(i32::from(kind.0), 0, self.tag_max(), writer);
    }

    /// Decodes a kind tag and dispatches to the registered reader.
    pub fn read(&self, reader: &mut BitReader) -> Result<BoxedMessage, MessageReadError> {
        debug_assert!(self.locked);

        let kind = de_ranged_int(reader, 0, self.tag_max())? as u16;
        let read_fn = self
            .readers
            .get(&kind)
            .ok_or(MessageReadError::UnknownKind { kind })?;
        Ok(read_fn(reader)?)
    }
}

impl Default for MessageKinds {
    fn default() -> Self {
        Self::new()
    }
}
