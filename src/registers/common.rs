//! Common registers
//!
//! This module contains registers shared by the LoRa and FSK/OOK modems:
//! - Operating mode and modem selection
//! - RF carrier frequency
//! - Power amplifier configuration
//! - Low noise amplifier configuration
//! - Silicon version

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::merge_bits;

/// FIFO data register (address: 0x00)
///
/// Reading or writing this address accesses the FIFO byte pointed to by
/// [`FifoAddrPtr`], which then auto-increments. Burst accesses are performed
/// through [`Device::read_fifo`](crate::Device::read_fifo) and
/// [`Device::write_fifo`](crate::Device::write_fifo).
pub const FIFO_ADDRESS: u8 = 0x00;

/// Operating mode register (address: 0x01)
///
/// # Bit Layout
/// - Bit 7: LongRangeMode (0 = FSK/OOK, 1 = LoRa)
/// - Bit 6: AccessSharedReg
/// - Bits 5-4: reserved in LoRa mode
/// - Bit 3: LowFrequencyModeOn
/// - Bits 2-0: Mode
///
/// # Important Notes
/// - LongRangeMode can only be modified in Sleep mode
/// - The chip may change Mode on its own (TX falls back to Standby once sent),
///   so this register must be re-read rather than cached
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// Raw register value
    pub value: u8,
}

impl OpMode {
    const LONG_RANGE_MODE: u8 = 0x80;
    const LOW_FREQUENCY_MODE: u8 = 0x08;
    const MODE: u8 = 0x07;

    /// 3-bit mode field
    pub fn mode(&self) -> u8 {
        self.value & Self::MODE
    }

    /// Replaces the mode field, leaving the other bits untouched
    pub fn set_mode(&mut self, mode: u8) {
        self.value = merge_bits(self.value, Self::MODE, mode);
    }

    /// Whether the LoRa modem is selected
    pub fn long_range_mode(&self) -> bool {
        self.value & Self::LONG_RANGE_MODE != 0
    }

    /// Selects the LoRa (true) or FSK/OOK (false) modem
    pub fn set_long_range_mode(&mut self, enabled: bool) {
        let bits = if enabled { Self::LONG_RANGE_MODE } else { 0 };
        self.value = merge_bits(self.value, Self::LONG_RANGE_MODE, bits);
    }

    /// Whether the low frequency register bank is selected
    pub fn low_frequency_mode(&self) -> bool {
        self.value & Self::LOW_FREQUENCY_MODE != 0
    }
}

/// RF carrier frequency register (address: 0x06-0x08)
///
/// 24-bit big-endian value spanning RegFrfMsb, RegFrfMid and RegFrfLsb.
///
/// Frf = F_rf * 2^19 / F_xosc
///
/// # Important Notes
/// - The frequency is only latched when RegFrfLsb is written, so the three
///   bytes are always written in a single burst
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct Frequency {
    /// 24-bit Frf value
    pub value: u32,
}

/// PA configuration register (address: 0x09)
///
/// # Bit Layout
/// - Bit 7: PaSelect (0 = RFO pin, 1 = PA_BOOST pin)
/// - Bits 6-4: MaxPower, Pmax = 10.8 + 0.6 * MaxPower dBm
/// - Bits 3-0: OutputPower
///
/// # Output Power
/// - PaSelect = 0: Pout = Pmax - (15 - OutputPower)
/// - PaSelect = 1: Pout = 17 - (15 - OutputPower)
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PaConfig {
    /// Raw register value
    pub value: u8,
}

impl Default for PaConfig {
    fn default() -> Self {
        Self { value: 0x4F }
    }
}

impl PaConfig {
    const PA_SELECT: u8 = 0x80;
    const MAX_POWER: u8 = 0x70;
    const OUTPUT_POWER: u8 = 0x0F;

    /// Whether the PA_BOOST output is selected
    pub fn boost(&self) -> bool {
        self.value & Self::PA_SELECT != 0
    }

    /// Selects PA_BOOST (true) or RFO (false), leaving the power codes untouched
    pub fn set_boost(&mut self, enabled: bool) {
        let bits = if enabled { Self::PA_SELECT } else { 0 };
        self.value = merge_bits(self.value, Self::PA_SELECT, bits);
    }

    /// 3-bit MaxPower code
    pub fn max_power(&self) -> u8 {
        (self.value & Self::MAX_POWER) >> 4
    }

    /// 4-bit OutputPower code
    pub fn output_power(&self) -> u8 {
        self.value & Self::OUTPUT_POWER
    }
}

/// LNA configuration register (address: 0x0C)
///
/// # Bit Layout
/// - Bits 7-5: LnaGain (1 = G1 highest gain ... 6 = G6 lowest gain)
/// - Bits 4-3: LnaBoostLf
/// - Bit 2: reserved
/// - Bits 1-0: LnaBoostHf
///
/// # Important Notes
/// - LnaGain is ignored while AGC is enabled in RegModemConfig3
#[register(0x0Cu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Lna {
    /// Raw register value
    pub value: u8,
}

impl Default for Lna {
    fn default() -> Self {
        Self { value: 0x20 }
    }
}

impl Lna {
    const GAIN: u8 = 0xE0;

    /// 3-bit gain step, 0 is not a valid setting
    pub fn gain(&self) -> u8 {
        (self.value & Self::GAIN) >> 5
    }

    /// Replaces the gain step, leaving the boost bits untouched
    pub fn set_gain(&mut self, step: u8) {
        self.value = merge_bits(self.value, Self::GAIN, step << 5);
    }
}

/// Silicon version register (address: 0x42)
///
/// Bits 7-4 hold the full revision number, bits 3-0 the metal mask revision.
/// Reads 0x12 on production SX1276/77/78/79 silicon.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct Version {
    /// Raw version code
    pub value: u8,
}

impl Version {
    /// Full revision number
    pub fn full_revision(&self) -> u8 {
        (self.value >> 4) & 0x0F
    }

    /// Metal mask revision number
    pub fn metal_mask(&self) -> u8 {
        self.value & 0x0F
    }
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for Frequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for Frequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let [_, msb, mid, lsb] = self.value.to_be_bytes();
        Ok([msb, mid, lsb])
    }
}

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}
