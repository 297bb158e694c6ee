use std::any::Any;

use tether_protocol::{
    BitReader, BitWrite, BoxedMessage, Message, MessageKind, MessageKinds, SerdeErr,
};

pub const TEST_MESSAGE_KIND: MessageKind = MessageKind(1);

const TEST_MESSAGE_MAGIC: u32 = 0xDEAD_BEEF;

/// The message the end-to-end suites push through the stack: a 16-bit
/// sequence, `sequence % 8` padding words so sizes vary, and a magic value
/// that verifies stream alignment on decode.
pub struct TestMessage {
    pub sequence: u16,
}

impl TestMessage {
    pub fn new(sequence: u16) -> Self {
        Self { sequence }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let sequence = reader.read_bits(16)? as u16;
        for _ in 0..sequence % 8 {
            if reader.read_bits(32)? != 0 {
                return Err(SerdeErr);
            }
        }
        if reader.read_bits(32)? != TEST_MESSAGE_MAGIC {
            return Err(SerdeErr);
        }
        Ok(Self { sequence })
    }
}

impl Message for TestMessage {
    fn kind(&self) -> MessageKind {
        TEST_MESSAGE_KIND
    }

    fn name(&self) -> &'static str {
        "TestMessage"
    }

    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(u32::from(self.sequence), 16);
        for _ in 0..self.sequence % 8 {
            writer.write_bits(0, 32);
        }
        writer.write_bits(TEST_MESSAGE_MAGIC, 32);
    }

    fn to_boxed_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds the locked registry both test endpoints share.
pub fn test_message_kinds() -> MessageKinds {
    let mut kinds = MessageKinds::new();
    kinds
        .register(TEST_MESSAGE_KIND, |reader| {
            TestMessage::de(reader).map(|message| Box::new(message) as BoxedMessage)
        })
        .expect("registering the test message");
    kinds.lock();
    kinds
}

#[cfg(test)]
mod tests {
    use super::{test_message_kinds, TestMessage, TEST_MESSAGE_KIND};
    use tether_protocol::{BitReader, BitWriter, Message};

    #[test]
    fn round_trips_through_the_registry() {
        let kinds = test_message_kinds();
        let message = TestMessage::new(13);

        let mut writer = BitWriter::with_capacity(64);
        kinds.ser_kind(message.kind(), &mut writer);
        message.ser(&mut writer);
        let buffer = writer.to_bytes();

        let mut reader = BitReader::new(&buffer);
        let decoded = kinds.read(&mut reader).unwrap();
        assert_eq!(decoded.kind(), TEST_MESSAGE_KIND);

        let decoded = decoded.to_boxed_any().downcast::<TestMessage>().unwrap();
        assert_eq!(decoded.sequence, 13);
    }

    #[test]
    fn size_varies_with_sequence() {
        assert_eq!(TestMessage::new(0).bit_length(), 48);
        assert_eq!(TestMessage::new(7).bit_length(), 48 + 7 * 32);
        assert_eq!(TestMessage::new(8).bit_length(), 48);
    }
}
