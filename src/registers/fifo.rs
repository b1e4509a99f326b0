//! FIFO and payload registers
//!
//! The SX127x has a single 256 byte FIFO shared between RX and TX. It is
//! accessed through one address pointer ([`FifoAddrPtr`]) and two base
//! addresses that partition it by direction:
//! - [`FifoRxBaseAddr`]: where the demodulator writes received payloads
//! - [`FifoTxBaseAddr`]: where the modulator reads payloads to send
//!
//! Because both directions go through the same pointer, it has to be
//! reprogrammed to the right base before every payload transfer.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Maximum number of payload bytes the FIFO can hold for one packet
pub const MAX_PAYLOAD_LENGTH: usize = 255;

/// FIFO address pointer register (address: 0x0D)
///
/// SPI interface address pointer in FIFO data buffer.
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct FifoAddrPtr {
    /// FIFO address
    pub addr: u8,
}

/// FIFO TX base address register (address: 0x0E)
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct FifoTxBaseAddr {
    /// Write base address in FIFO data buffer for TX modulator
    /// Default: 0x80
    pub addr: u8,
}

impl Default for FifoTxBaseAddr {
    fn default() -> Self {
        Self { addr: 0x80 }
    }
}

/// FIFO RX base address register (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct FifoRxBaseAddr {
    /// Read base address in FIFO data buffer for RX demodulator
    /// Default: 0x00
    pub addr: u8,
}

/// FIFO RX current address register (address: 0x10, read-only)
///
/// Start address (in data buffer) of the last packet received.
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct FifoRxCurrentAddr {
    /// Start address of the last received packet
    pub addr: u8,
}

/// Received byte count register (address: 0x13, read-only)
///
/// Number of payload bytes of the last packet received.
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct RxNbBytes {
    /// Payload length of the last received packet
    pub count: u8,
}

/// Payload length register (address: 0x22)
///
/// Number of bytes to transmit. In implicit header mode it is also the
/// expected number of bytes to receive.
///
/// # Important Notes
/// - A value of 0 is not permitted
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PayloadLength {
    /// Payload length in bytes
    pub length: u8,
}

impl Default for PayloadLength {
    fn default() -> Self {
        Self { length: 0x01 }
    }
}

/// Maximum payload length register (address: 0x23)
///
/// If the header payload length exceeds this value a header CRC error is
/// generated, which filters out packets with a bit error on the length field.
#[register(0x23u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct MaxPayloadLength {
    /// Maximum payload length in bytes
    pub length: u8,
}

impl Default for MaxPayloadLength {
    fn default() -> Self {
        Self { length: 0xFF }
    }
}

impl FromByteArray for FifoAddrPtr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { addr: bytes[0] })
    }
}

impl ToByteArray for FifoAddrPtr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.addr])
    }
}

impl FromByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { addr: bytes[0] })
    }
}

impl ToByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.addr])
    }
}

impl FromByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { addr: bytes[0] })
    }
}

impl ToByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.addr])
    }
}

impl FromByteArray for FifoRxCurrentAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { addr: bytes[0] })
    }
}

impl FromByteArray for RxNbBytes {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { count: bytes[0] })
    }
}

impl FromByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { length: bytes[0] })
    }
}

impl ToByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}

impl FromByteArray for MaxPayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { length: bytes[0] })
    }
}

impl ToByteArray for MaxPayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}
