use proptest::prelude::*;

use tether_protocol::{
    de_block_bytes, de_ranged_int, ser_block_bytes, ser_ranged_int, BitReader, BitWrite, BitWriter,
};

#[test]
fn mixed_integers_and_bits_round_trip() {
    let mut writer = BitWriter::with_capacity(16);
    ser_ranged_int(-5, -10, 10, &mut writer);
    writer.write_bits(0xDEAD_BEEF, 32);
    ser_ranged_int(0, 0, 255, &mut writer);
    let buffer = writer.to_bytes();

    let mut reader = BitReader::new(&buffer);
    assert_eq!(de_ranged_int(&mut reader, -10, 10).unwrap(), -5);
    assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
    assert_eq!(de_ranged_int(&mut reader, 0, 255).unwrap(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Bits { value: u32, bits: u32 },
    Ranged { value: i32, min: i32, max: i32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let bits = (1u32..=32).prop_flat_map(|bits| {
        let max = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
        (0..=max).prop_map(move |value| Op::Bits { value, bits })
    });
    let ranged = (-100_000i32..100_000, 1i32..100_000).prop_flat_map(|(min, span)| {
        (0..=span).prop_map(move |offset| Op::Ranged {
            value: min + offset,
            min,
            max: min + span,
        })
    });
    prop_oneof![bits, ranged]
}

proptest! {
    #[test]
    fn arbitrary_streams_round_trip(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = BitWriter::with_capacity(1024);
        for op in &ops {
            match op {
                Op::Bits { value, bits } => writer.write_bits(*value, *bits),
                Op::Ranged { value, min, max } => ser_ranged_int(*value, *min, *max, &mut writer),
            }
        }
        let buffer = writer.to_bytes();

        let mut reader = BitReader::new(&buffer);
        for op in &ops {
            match op {
                Op::Bits { value, bits } => {
                    prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value);
                }
                Op::Ranged { value, min, max } => {
                    prop_assert_eq!(de_ranged_int(&mut reader, *min, *max).unwrap(), *value);
                }
            }
        }
    }

    #[test]
    fn block_payloads_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..512)) {
        let mut writer = BitWriter::with_capacity(1024);
        writer.write_bits(0x2A, 6); // misalign the stream first
        ser_block_bytes(&bytes, 512, &mut writer);
        let buffer = writer.to_bytes();

        let mut reader = BitReader::new(&buffer);
        prop_assert_eq!(reader.read_bits(6).unwrap(), 0x2A);
        prop_assert_eq!(de_block_bytes(&mut reader, 512).unwrap(), bytes);
    }
}
