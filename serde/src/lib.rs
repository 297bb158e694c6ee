//! # Tether Serde
//! Bit-level serialization used by every tether wire format.

mod bit_counter;
mod bit_reader;
mod bit_writer;
mod block;
mod error;
mod ranged;
mod serde;

pub use bit_counter::BitCounter;
pub use bit_reader::BitReader;
pub use bit_writer::{BitWrite, BitWriter};
pub use block::{de_block_bytes, de_raw_bytes, ser_block_bytes, ser_raw_bytes};
pub use error::SerdeErr;
pub use ranged::{bits_required, de_ranged_int, ser_ranged_int};
pub use serde::Serde;
