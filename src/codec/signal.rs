//! Signal quality read-back
//!
//! RSSI registers report dB relative to a port-dependent offset, and the
//! packet SNR register holds a signed value in quarter dB steps.

/// RSSI offset when the low frequency port (below 525 MHz) is selected
pub const RSSI_OFFSET_LF: i32 = -164;

/// RSSI offset when the high frequency port is selected
pub const RSSI_OFFSET_HF: i32 = -157;

/// Converts the raw packet SNR register into dB, truncated toward zero
pub fn snr_db(raw: i8) -> i32 {
    i32::from(raw) / 4
}

/// Converts a raw RSSI register value into dBm
pub fn rssi_dbm(raw: u8, low_frequency: bool) -> i32 {
    let offset = if low_frequency {
        RSSI_OFFSET_LF
    } else {
        RSSI_OFFSET_HF
    };

    offset + i32::from(raw)
}

/// Converts the raw packet RSSI into dBm.
///
/// When the packet SNR is negative the packet was received below the noise
/// floor and its SNR contributes to the reported strength.
pub fn packet_rssi_dbm(raw_rssi: u8, raw_snr: i8, low_frequency: bool) -> i32 {
    let rssi = rssi_dbm(raw_rssi, low_frequency);

    if raw_snr < 0 {
        rssi + snr_db(raw_snr)
    } else {
        rssi
    }
}
