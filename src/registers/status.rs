//! Status registers
//!
//! This module contains the read-back registers used while exchanging packets:
//! - Interrupt flags
//! - Last packet SNR and RSSI
//! - Current RSSI
//!
//! None of these are cached by the driver; every query reads the chip.

use core::convert::Infallible;

use bitflags::bitflags;
use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// LoRa interrupt flags
    ///
    /// Each flag is write-1-to-clear: writing a set bit to RegIrqFlags clears
    /// that condition and leaves the others untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// Timeout interrupt, RX single mode only
        const RX_TIMEOUT = 1 << 7;
        /// Packet reception complete
        const RX_DONE = 1 << 6;
        /// Payload CRC error
        const PAYLOAD_CRC_ERROR = 1 << 5;
        /// Valid header received in RX
        const VALID_HEADER = 1 << 4;
        /// FIFO payload transmission complete
        const TX_DONE = 1 << 3;
        /// CAD complete
        const CAD_DONE = 1 << 2;
        /// FHSS change channel
        const FHSS_CHANGE_CHANNEL = 1 << 1;
        /// Valid LoRa signal detected during CAD
        const CAD_DETECTED = 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "IrqFlags {{ 0b{=u8:08b} }}", self.bits())
    }
}

/// Interrupt flags register (address: 0x12)
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct IrqFlagsRegister {
    /// Pending flags on read, flags to clear on write
    pub flags: IrqFlags,
}

/// Last packet SNR register (address: 0x19, read-only)
///
/// Estimation of SNR on the last packet received, in two's complement and
/// quarter dB steps.
#[register(0x19u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct PktSnrValue {
    /// SNR * 4
    pub value: i8,
}

/// Last packet RSSI register (address: 0x1A, read-only)
///
/// RSSI of the latest packet received, in dB relative to the port offset.
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct PktRssiValue {
    /// Raw RSSI value
    pub value: u8,
}

/// Current RSSI register (address: 0x1B, read-only)
#[register(0x1Bu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct RssiValue {
    /// Raw RSSI value
    pub value: u8,
}

impl FromByteArray for IrqFlagsRegister {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlagsRegister {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl FromByteArray for PktSnrValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: bytes[0] as i8,
        })
    }
}

impl FromByteArray for PktRssiValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl FromByteArray for RssiValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}
