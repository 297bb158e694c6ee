use crate::{bit_counter::BitCounter, bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr};

/// A type that can round-trip through a bit stream.
pub trait Serde: Sized {
    fn ser(&self, writer: &mut dyn BitWrite);

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Serialized size in bits, measured by replaying `ser` into a counter.
    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits()
    }
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_byte(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_byte()
    }

    fn bit_length(&self) -> u32 {
        8
    }
}

impl Serde for u16 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(u32::from(*self), 16);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_bits(16)? as u16)
    }

    fn bit_length(&self) -> u32 {
        16
    }
}

impl Serde for u32 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(*self, 32);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bits(32)
    }

    fn bit_length(&self) -> u32 {
        32
    }
}

impl Serde for u64 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits((*self & 0xFFFF_FFFF) as u32, 32);
        writer.write_bits((*self >> 32) as u32, 32);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let low = u64::from(reader.read_bits(32)?);
        let high = u64::from(reader.read_bits(32)?);
        Ok(low | (high << 32))
    }

    fn bit_length(&self) -> u32 {
        64
    }
}
