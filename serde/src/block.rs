use crate::{
    bit_reader::BitReader,
    bit_writer::BitWrite,
    error::SerdeErr,
    ranged::{de_ranged_int, ser_ranged_int},
};

/// Writes raw bytes word-packed: whole 32-bit words first, then a byte
/// tail. The length is not encoded; the reader must know it.
pub fn ser_raw_bytes(bytes: &[u8], writer: &mut dyn BitWrite) {
    let num_words = bytes.len() / 4;

    for i in 0..num_words {
        let word = u32::from(bytes[i * 4])
            | (u32::from(bytes[i * 4 + 1]) << 8)
            | (u32::from(bytes[i * 4 + 2]) << 16)
            | (u32::from(bytes[i * 4 + 3]) << 24);
        writer.write_bits(word, 32);
    }

    for &byte in &bytes[num_words * 4..] {
        writer.write_bits(u32::from(byte), 8);
    }
}

/// Mirror of [`ser_raw_bytes`] for a known `num_bytes`.
pub fn de_raw_bytes(reader: &mut BitReader, num_bytes: usize) -> Result<Vec<u8>, SerdeErr> {
    let mut bytes = vec![0u8; num_bytes];
    let num_words = num_bytes / 4;

    for i in 0..num_words {
        let word = reader.read_bits(32)?;
        bytes[i * 4] = (word & 0xFF) as u8;
        bytes[i * 4 + 1] = ((word >> 8) & 0xFF) as u8;
        bytes[i * 4 + 2] = ((word >> 16) & 0xFF) as u8;
        bytes[i * 4 + 3] = ((word >> 24) & 0xFF) as u8;
    }

    for byte in bytes.iter_mut().skip(num_words * 4) {
        *byte = reader.read_bits(8)? as u8;
    }

    Ok(bytes)
}

/// Block payload coding: size-1 as a ranged int in `[0, max_bytes - 1]`,
/// then the bytes word-packed. Blocks are never empty.
pub fn ser_block_bytes(bytes: &[u8], max_bytes: usize, writer: &mut dyn BitWrite) {
    debug_assert!(!bytes.is_empty());
    debug_assert!(bytes.len() <= max_bytes);

    ser_ranged_int((bytes.len() - 1) as i32, 0, (max_bytes - 1) as i32, writer);
    ser_raw_bytes(bytes, writer);
}

/// Mirror of [`ser_block_bytes`].
pub fn de_block_bytes(reader: &mut BitReader, max_bytes: usize) -> Result<Vec<u8>, SerdeErr> {
    let num_bytes = de_ranged_int(reader, 0, (max_bytes - 1) as i32)? as usize + 1;
    de_raw_bytes(reader, num_bytes)
}
