//! Register definitions for the SX127x radio in LoRa mode
//! Generated from the SX1276/77/78/79 datasheet rev. 7 register map
//!
//! Several registers pack unrelated fields into one byte. Their types keep the
//! raw byte and expose setters that only touch the bits of one field, so a
//! read, [`merge_bits`], write cycle (see
//! [`Device::modify_register`](crate::Device::modify_register)) never clobbers
//! configuration owned by another field.

mod common;
mod fifo;
mod modem;
mod status;

pub use common::*;
pub use fifo::*;
pub use modem::*;
pub use status::*;

/// Replaces the bits selected by `mask` in `current` with the matching bits of `bits`
pub const fn merge_bits(current: u8, mask: u8, bits: u8) -> u8 {
    (current & !mask) | (bits & mask)
}
