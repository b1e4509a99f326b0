//! LoRa modem configuration registers
//!
//! This module contains the registers that define the LoRa modulation and
//! packet format:
//! - Bandwidth, coding rate and header mode (RegModemConfig1)
//! - Spreading factor, CRC and RX symbol timeout (RegModemConfig2, RegSymbTimeoutLsb)
//! - Preamble length (RegPreambleMsb/Lsb)
//! - AGC and low data rate optimisation (RegModemConfig3)
//!
//! The modem configuration registers pack several fields per byte, so they
//! are modelled as raw bytes with field accessors that only touch their own
//! bits.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::merge_bits;

/// Modem configuration register 1 (address: 0x1D)
///
/// # Bit Layout
/// - Bits 7-4: Bw, index into the bandwidth table (0 = 7.8 kHz ... 9 = 500 kHz)
/// - Bits 3-1: CodingRate, denominator - 4 (1 = 4/5 ... 4 = 4/8)
/// - Bit 0: ImplicitHeaderModeOn
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig1 {
    /// Raw register value
    pub value: u8,
}

impl Default for ModemConfig1 {
    fn default() -> Self {
        Self { value: 0x72 }
    }
}

impl ModemConfig1 {
    const BANDWIDTH: u8 = 0xF0;
    const CODING_RATE: u8 = 0x0E;
    const IMPLICIT_HEADER: u8 = 0x01;

    /// 4-bit bandwidth index
    pub fn bandwidth(&self) -> u8 {
        (self.value & Self::BANDWIDTH) >> 4
    }

    /// Replaces the bandwidth index
    pub fn set_bandwidth(&mut self, index: u8) {
        self.value = merge_bits(self.value, Self::BANDWIDTH, index << 4);
    }

    /// 3-bit coding rate field
    pub fn coding_rate(&self) -> u8 {
        (self.value & Self::CODING_RATE) >> 1
    }

    /// Replaces the coding rate field
    pub fn set_coding_rate(&mut self, field: u8) {
        self.value = merge_bits(self.value, Self::CODING_RATE, field << 1);
    }

    /// Whether implicit header mode is enabled
    pub fn implicit_header(&self) -> bool {
        self.value & Self::IMPLICIT_HEADER != 0
    }

    /// Enables (true) or disables (false) implicit header mode
    pub fn set_implicit_header(&mut self, enabled: bool) {
        let bits = if enabled { Self::IMPLICIT_HEADER } else { 0 };
        self.value = merge_bits(self.value, Self::IMPLICIT_HEADER, bits);
    }
}

/// Modem configuration register 2 (address: 0x1E)
///
/// # Bit Layout
/// - Bits 7-4: SpreadingFactor, log2 of chips per symbol (6 ... 12)
/// - Bit 3: TxContinuousMode
/// - Bit 2: RxPayloadCrcOn
/// - Bits 1-0: SymbTimeout(9:8)
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig2 {
    /// Raw register value
    pub value: u8,
}

impl Default for ModemConfig2 {
    fn default() -> Self {
        Self { value: 0x70 }
    }
}

impl ModemConfig2 {
    const SPREADING_FACTOR: u8 = 0xF0;
    const RX_PAYLOAD_CRC_ON: u8 = 0x04;
    const SYMB_TIMEOUT_MSB: u8 = 0x03;

    /// 4-bit spreading factor field
    pub fn spreading_factor(&self) -> u8 {
        (self.value & Self::SPREADING_FACTOR) >> 4
    }

    /// Replaces the spreading factor field
    pub fn set_spreading_factor(&mut self, sf: u8) {
        self.value = merge_bits(self.value, Self::SPREADING_FACTOR, sf << 4);
    }

    /// Whether payload CRC generation and check is enabled
    pub fn rx_payload_crc_on(&self) -> bool {
        self.value & Self::RX_PAYLOAD_CRC_ON != 0
    }

    /// Enables (true) or disables (false) payload CRC
    pub fn set_rx_payload_crc_on(&mut self, enabled: bool) {
        let bits = if enabled { Self::RX_PAYLOAD_CRC_ON } else { 0 };
        self.value = merge_bits(self.value, Self::RX_PAYLOAD_CRC_ON, bits);
    }

    /// Upper two bits of the RX symbol timeout
    pub fn symb_timeout_msb(&self) -> u8 {
        self.value & Self::SYMB_TIMEOUT_MSB
    }

    /// Replaces the upper two bits of the RX symbol timeout
    pub fn set_symb_timeout_msb(&mut self, bits: u8) {
        self.value = merge_bits(self.value, Self::SYMB_TIMEOUT_MSB, bits);
    }
}

/// RX symbol timeout LSB register (address: 0x1F)
///
/// Lower eight bits of the 10-bit RX single mode timeout, in symbols.
#[register(0x1Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct SymbTimeoutLsb {
    /// SymbTimeout(7:0)
    pub value: u8,
}

impl Default for SymbTimeoutLsb {
    fn default() -> Self {
        Self { value: 0x64 }
    }
}

/// Preamble length register (address: 0x20-0x21)
///
/// 16-bit big-endian preamble length in symbols, spanning RegPreambleMsb and
/// RegPreambleLsb. The chip adds 4.25 symbols to the programmed value.
#[register(0x20u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PreambleLength {
    /// Preamble length in symbols
    pub length: u16,
}

impl Default for PreambleLength {
    fn default() -> Self {
        Self { length: 0x0008 }
    }
}

/// Modem configuration register 3 (address: 0x26)
///
/// # Bit Layout
/// - Bits 7-4: unused
/// - Bit 3: LowDataRateOptimize
/// - Bit 2: AgcAutoOn, LNA gain set by the internal AGC loop instead of RegLna
/// - Bits 1-0: reserved
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct ModemConfig3 {
    /// Raw register value
    pub value: u8,
}

impl ModemConfig3 {
    const AGC_AUTO_ON: u8 = 0x04;

    /// Whether the AGC loop controls the LNA gain
    pub fn agc_auto_on(&self) -> bool {
        self.value & Self::AGC_AUTO_ON != 0
    }

    /// Enables (true) or disables (false) the AGC loop
    pub fn set_agc_auto_on(&mut self, enabled: bool) {
        let bits = if enabled { Self::AGC_AUTO_ON } else { 0 };
        self.value = merge_bits(self.value, Self::AGC_AUTO_ON, bits);
    }
}

impl FromByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for SymbTimeoutLsb {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for SymbTimeoutLsb {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            length: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.length.to_be_bytes())
    }
}

impl FromByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}
