//! RF front-end conversions
//!
//! - Carrier frequency <-> 24-bit Frf
//! - Output power in dBm <-> PA configuration codes
//! - LNA gain in dB <-> 3-bit gain step

use crate::registers::{merge_bits, PaConfig};
use crate::Error;

/// Frf has 19 fractional bits: Fstep = F_xosc / 2^19
pub const FREQUENCY_FRACTION_BITS: u32 = 19;

/// Largest value the 24-bit Frf field can hold
pub const FREQUENCY_REGISTER_MAX: u32 = 0x00FF_FFFF;

/// Converts a carrier frequency in Hz into the Frf register value.
///
/// Frf = round(F_rf * 2^19 / F_xosc)
///
/// # Errors
/// * `Error::InvalidParameter` - crystal frequency is zero or the result does
///   not fit in 24 bits
pub fn encode_frequency(hz: u32, crystal_hz: u32) -> Result<u32, Error> {
    if crystal_hz == 0 {
        return Err(Error::InvalidParameter);
    }

    let crystal = u64::from(crystal_hz);
    let frf = ((u64::from(hz) << FREQUENCY_FRACTION_BITS) + crystal / 2) / crystal;

    u32::try_from(frf)
        .ok()
        .filter(|frf| *frf <= FREQUENCY_REGISTER_MAX)
        .ok_or(Error::InvalidParameter)
}

/// Converts an Frf register value back into a carrier frequency in Hz.
///
/// F_rf = Frf * F_xosc / 2^19, truncated
pub fn decode_frequency(frf: u32, crystal_hz: u32) -> u32 {
    let hz = (u64::from(frf & FREQUENCY_REGISTER_MAX) * u64::from(crystal_hz))
        >> FREQUENCY_FRACTION_BITS;
    u32::try_from(hz).unwrap_or(u32::MAX)
}

/// Lowest output power the PA codes can express
pub const MIN_POWER_DBM: i32 = -3;

/// Highest output power the PA codes can express
pub const MAX_POWER_DBM: i32 = 17;

/// PA configuration codes for one output power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerCode {
    /// PA_BOOST output selected
    pub boost: bool,
    /// 3-bit MaxPower code
    pub max_power: u8,
    /// 4-bit OutputPower code
    pub output_power: u8,
}

impl PowerCode {
    /// Extracts the power codes from a PA configuration register
    pub fn from_register(register: PaConfig) -> Self {
        Self {
            boost: register.boost(),
            max_power: register.max_power(),
            output_power: register.output_power(),
        }
    }

    /// Packs the power codes into a PA configuration register
    pub fn to_register(self) -> PaConfig {
        let mut value = merge_bits(0, 0x70, self.max_power << 4);
        value = merge_bits(value, 0x0F, self.output_power);
        let mut register = PaConfig { value };
        register.set_boost(self.boost);
        register
    }
}

/// Selects the PA codes producing `dbm` on the output.
///
/// - above 15 dBm: PA_BOOST, MaxPower 7, OutputPower = dBm - 2
/// - below 0 dBm: RFO, MaxPower 2, OutputPower = dBm + 3
/// - otherwise: RFO, MaxPower 7, OutputPower = dBm
///
/// # Errors
/// * `Error::InvalidParameter` - the OutputPower code would not fit in 4 bits
pub fn encode_power(dbm: i32) -> Result<PowerCode, Error> {
    if !(MIN_POWER_DBM..=MAX_POWER_DBM).contains(&dbm) {
        return Err(Error::InvalidParameter);
    }

    let (boost, max_power, output_power) = if dbm > 15 {
        (true, 7, dbm - 2)
    } else if dbm < 0 {
        (false, 2, dbm + 3)
    } else {
        (false, 7, dbm)
    };

    Ok(PowerCode {
        boost,
        max_power,
        output_power: output_power as u8,
    })
}

/// Recovers the output power in dBm from the PA codes.
///
/// Without boost the datasheet formula Pmax - (15 - OutputPower) is evaluated
/// in tenths of a dB and truncated, so fractional Pmax values round toward zero.
pub fn decode_power(code: PowerCode) -> i32 {
    let output_power = i32::from(code.output_power);

    if code.boost {
        output_power + 2
    } else {
        let pmax = 108 + 6 * i32::from(code.max_power);
        (pmax - (150 - output_power * 10)) / 10
    }
}

/// LNA gain in dB for steps G1 to G6, highest gain first
pub const LNA_GAIN_TABLE: [i8; 6] = [0, -6, -12, -24, -26, -48];

/// Selects the LNA gain step for `db`.
///
/// Scans [`LNA_GAIN_TABLE`] in order and takes the first entry that does not
/// exceed the request; requests below the table floor select G6.
///
/// # Returns
/// Gain step, 1 to 6
pub fn encode_lna_gain(db: i32) -> u8 {
    let index = LNA_GAIN_TABLE
        .iter()
        .position(|gain| i32::from(*gain) <= db)
        .unwrap_or(LNA_GAIN_TABLE.len() - 1);

    index as u8 + 1
}

/// Returns the gain in dB of an LNA gain step.
///
/// # Errors
/// * `Error::InvalidParameter` - step 0 (no gain selected) or beyond G6
pub fn decode_lna_gain(step: u8) -> Result<i32, Error> {
    usize::from(step)
        .checked_sub(1)
        .and_then(|index| LNA_GAIN_TABLE.get(index))
        .map(|gain| i32::from(*gain))
        .ok_or(Error::InvalidParameter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XTAL: u32 = 32_000_000;

    #[test]
    fn frequency_433mhz_matches_datasheet() {
        // 433 MHz * 2^19 / 32 MHz = 0x6C4000
        assert_eq!(encode_frequency(433_000_000, XTAL), Ok(0x6C4000));
        assert_eq!(decode_frequency(0x6C4000, XTAL), 433_000_000);
    }

    #[test]
    fn frequency_round_trip_within_one_step() {
        let step = XTAL >> FREQUENCY_FRACTION_BITS;
        for hz in [137_000_000u32, 433_175_000, 868_100_000, 915_000_001, 1_020_000_000] {
            let frf = encode_frequency(hz, XTAL).unwrap();
            let back = decode_frequency(frf, XTAL);
            assert!(back.abs_diff(hz) <= step + 1, "{hz} decoded as {back}");
        }
    }

    #[test]
    fn frequency_rounds_to_nearest() {
        // one step is 61.03515625 Hz, 40 Hz is closer to one step than to zero
        assert_eq!(encode_frequency(40, XTAL), Ok(1));
        assert_eq!(encode_frequency(20, XTAL), Ok(0));
    }

    #[test]
    fn frequency_follows_crystal_override() {
        let frf = encode_frequency(433_000_000, 26_000_000).unwrap();
        assert_ne!(frf, encode_frequency(433_000_000, XTAL).unwrap());
        assert!(decode_frequency(frf, 26_000_000).abs_diff(433_000_000) <= 50);
    }

    #[test]
    fn frequency_beyond_24_bits_for_crystal_is_rejected() {
        // 868 MHz * 2^19 / 26 MHz is about 17.5M, above the 24-bit field
        assert_eq!(
            encode_frequency(868_000_000, 26_000_000),
            Err(Error::InvalidParameter)
        );
        assert!(encode_frequency(868_000_000, XTAL).is_ok());
    }

    #[test]
    fn frequency_out_of_range_is_rejected() {
        assert_eq!(encode_frequency(u32::MAX, XTAL), Err(Error::InvalidParameter));
        assert_eq!(encode_frequency(868_000_000, 0), Err(Error::InvalidParameter));
    }

    #[test]
    fn power_round_trip_is_exact() {
        for dbm in -2..=17 {
            let code = encode_power(dbm).unwrap();
            assert_eq!(code.boost, dbm > 15);
            assert_eq!(decode_power(code), dbm, "{dbm} dBm");
        }
    }

    #[test]
    fn power_codes_by_range() {
        assert_eq!(
            encode_power(17),
            Ok(PowerCode { boost: true, max_power: 7, output_power: 15 })
        );
        assert_eq!(
            encode_power(-1),
            Ok(PowerCode { boost: false, max_power: 2, output_power: 2 })
        );
        assert_eq!(
            encode_power(10),
            Ok(PowerCode { boost: false, max_power: 7, output_power: 10 })
        );
    }

    #[test]
    fn power_outside_four_bit_code_is_rejected() {
        for dbm in [18, 19, 20, -4] {
            assert_eq!(encode_power(dbm), Err(Error::InvalidParameter));
        }
    }

    #[test]
    fn power_decode_truncates_fractional_pmax() {
        // MaxPower 4 gives Pmax 13.2 dBm, OutputPower 15 -> 13.2 dBm reported as 13
        let code = PowerCode { boost: false, max_power: 4, output_power: 15 };
        assert_eq!(decode_power(code), 13);
        // MaxPower 0 gives Pmax 10.8 dBm, OutputPower 0 -> -4.2 dBm reported as -4
        let code = PowerCode { boost: false, max_power: 0, output_power: 0 };
        assert_eq!(decode_power(code), -4);
    }

    #[test]
    fn power_code_register_packing() {
        let code = encode_power(17).unwrap();
        assert_eq!(code.to_register().value, 0xFF);
        assert_eq!(PowerCode::from_register(PaConfig { value: 0x2A }), PowerCode {
            boost: false,
            max_power: 2,
            output_power: 10,
        });
    }

    #[test]
    fn lna_selects_first_entry_not_above_request() {
        assert_eq!(encode_lna_gain(0), 1);
        assert_eq!(encode_lna_gain(5), 1);
        assert_eq!(encode_lna_gain(-1), 2);
        assert_eq!(encode_lna_gain(-6), 2);
        assert_eq!(encode_lna_gain(-25), 5);
        assert_eq!(encode_lna_gain(-30), 6);
        assert_eq!(encode_lna_gain(-50), 6);
    }

    #[test]
    fn lna_decode_rejects_unset_step() {
        assert_eq!(decode_lna_gain(0), Err(Error::InvalidParameter));
        assert_eq!(decode_lna_gain(7), Err(Error::InvalidParameter));
        assert_eq!(decode_lna_gain(1), Ok(0));
        assert_eq!(decode_lna_gain(6), Ok(-48));
    }
}
