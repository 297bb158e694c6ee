use std::any::Any;

use tether_serde::{BitCounter, BitWrite};

use crate::messages::message_kinds::MessageKind;

/// A structured payload carried by a channel. Implementors serialize
/// themselves into a bit stream; the matching reader is registered in
/// [`MessageKinds`](crate::messages::message_kinds::MessageKinds) under the
/// same kind tag, so the receiver can materialize the right variant from
/// the wire.
pub trait Message: 'static {
    /// The numeric type tag, stable on the wire.
    fn kind(&self) -> MessageKind;

    /// Short name for log lines.
    fn name(&self) -> &'static str;

    fn ser(&self, writer: &mut dyn BitWrite);

    /// Serialized payload size in bits, measured by replaying `ser`.
    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits()
    }

    fn to_boxed_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_any(&self) -> &dyn Any;
}

pub type BoxedMessage = Box<dyn Message>;
