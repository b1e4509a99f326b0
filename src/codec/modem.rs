//! LoRa modem conversions
//!
//! - Bandwidth in Hz <-> 4-bit bandwidth index
//! - Chips per symbol <-> spreading factor field
//! - Coding rate byte <-> 3-bit coding rate field
//! - RX symbol timeout, in symbols and in milliseconds

use crate::Error;

/// Signal bandwidths in Hz, indexed by the RegModemConfig1 Bw field
pub const BANDWIDTH_TABLE: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// Selects the narrowest bandwidth not below `hz`.
///
/// Requests above 500 kHz select the widest bandwidth.
pub fn encode_bandwidth(hz: u32) -> u8 {
    let index = BANDWIDTH_TABLE
        .iter()
        .position(|bandwidth| *bandwidth >= hz)
        .unwrap_or(BANDWIDTH_TABLE.len() - 1);

    index as u8
}

/// Returns the bandwidth in Hz of a bandwidth index.
///
/// # Errors
/// * `Error::InvalidParameter` - index is one of the reserved values 10 to 15
pub fn decode_bandwidth(index: u8) -> Result<u32, Error> {
    BANDWIDTH_TABLE
        .get(usize::from(index))
        .copied()
        .ok_or(Error::InvalidParameter)
}

/// Smallest spreading factor accepted by the encoder
pub const MIN_SPREADING_FACTOR: u8 = 6;

/// Largest spreading factor accepted by the encoder
pub const MAX_SPREADING_FACTOR: u8 = 11;

/// Converts chips per symbol into the spreading factor field.
///
/// # Errors
/// * `Error::InvalidParameter` - `chips` is not a power of two in 64 to 2048
pub fn encode_spreading_factor(chips: u32) -> Result<u8, Error> {
    (MIN_SPREADING_FACTOR..=MAX_SPREADING_FACTOR)
        .find(|sf| 1u32 << sf == chips)
        .ok_or(Error::InvalidParameter)
}

/// Converts the spreading factor field into chips per symbol
pub fn decode_spreading_factor(field: u8) -> u32 {
    1u32 << (field & 0x0F)
}

/// Converts a coding rate byte into the coding rate field.
///
/// The byte carries the numerator in its high nibble and the denominator in
/// its low nibble, so 4/5 is `0x45`. Only numerator 4 exists on the chip.
///
/// # Errors
/// * `Error::InvalidParameter` - numerator is not 4 or denominator is outside 4 to 8
pub fn encode_coding_rate(rate: u8) -> Result<u8, Error> {
    let numerator = rate >> 4;
    let denominator = rate & 0x0F;

    if numerator != 4 || !(4..=8).contains(&denominator) {
        return Err(Error::InvalidParameter);
    }

    Ok(denominator - 4)
}

/// Converts the coding rate field into a coding rate byte
pub fn decode_coding_rate(field: u8) -> u8 {
    0x40 + (field & 0x07) + 4
}

/// Smallest programmable RX symbol timeout
pub const MIN_SYMBOL_TIMEOUT: u16 = 1;

/// Largest programmable RX symbol timeout (10 bits)
pub const MAX_SYMBOL_TIMEOUT: u16 = 0x03FF;

/// Clamps a symbol count into the 10-bit timeout field
pub fn clamp_symbol_timeout(symbols: u32) -> u16 {
    symbols.clamp(u32::from(MIN_SYMBOL_TIMEOUT), u32::from(MAX_SYMBOL_TIMEOUT)) as u16
}

/// Splits a symbol timeout into the RegModemConfig2 bits and the LSB register
pub fn split_symbol_timeout(symbols: u16) -> (u8, u8) {
    let [msb, lsb] = symbols.to_be_bytes();
    (msb & 0x03, lsb)
}

/// Joins the RegModemConfig2 bits and the LSB register into a symbol timeout
pub fn join_symbol_timeout(msb: u8, lsb: u8) -> u16 {
    u16::from_be_bytes([msb & 0x03, lsb])
}

/// Converts a timeout in milliseconds into symbols, truncated.
///
/// symbols = ms * BW / (chips * 1000)
pub fn timeout_ms_to_symbols(ms: u32, bandwidth_hz: u32, chips: u32) -> u32 {
    let divisor = u64::from(chips) * 1000;
    if divisor == 0 {
        return 0;
    }

    let symbols = u64::from(ms) * u64::from(bandwidth_hz) / divisor;
    u32::try_from(symbols).unwrap_or(u32::MAX)
}

/// Converts a timeout in symbols into milliseconds, truncated.
///
/// ms = 1000 * symbols * chips / BW
pub fn timeout_symbols_to_ms(symbols: u32, bandwidth_hz: u32, chips: u32) -> u32 {
    if bandwidth_hz == 0 {
        return 0;
    }

    let ms = 1000 * u64::from(symbols) * u64::from(chips) / u64::from(bandwidth_hz);
    u32::try_from(ms).unwrap_or(u32::MAX)
}
