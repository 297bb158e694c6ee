use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr};

/// Number of bits needed to encode any value in `[min, max]` as an offset
/// from `min`. Requires `min < max`.
pub fn bits_required(min: i32, max: i32) -> u32 {
    debug_assert!(min < max);

    let range = (max as i64 - min as i64) as u64;
    64 - range.leading_zeros()
}

/// Encodes `value - min` in [`bits_required`]`(min, max)` bits. Writing a
/// value outside `[min, max]` is a programming error; callers budget their
/// writes so this cannot happen on a live packet.
pub fn ser_ranged_int(value: i32, min: i32, max: i32, writer: &mut dyn BitWrite) {
    debug_assert!(min <= value && value <= max);

    let bits = bits_required(min, max);
    let unsigned = (value as i64 - min as i64) as u32;
    writer.write_bits(unsigned, bits);
}

/// Mirror of [`ser_ranged_int`]. A decoded offset that lands past `max` is
/// malformed input and fails the read.
pub fn de_ranged_int(reader: &mut BitReader, min: i32, max: i32) -> Result<i32, SerdeErr> {
    let bits = bits_required(min, max);
    let unsigned = reader.read_bits(bits)? as i64;

    let value = min as i64 + unsigned;
    if value > max as i64 {
        return Err(SerdeErr);
    }
    Ok(value as i32)
}
