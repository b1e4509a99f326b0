//! Register codec
//!
//! Pure conversions between radio parameters in physical units and the packed
//! field values stored in the chip's registers. Nothing in here touches the
//! bus; the [`Radio`](crate::Radio) combines these with the typed registers.
//!
//! # Parameter Families
//! - [`rf`]: carrier frequency, PA output power, LNA gain
//! - [`modem`]: bandwidth, spreading factor, coding rate, RX symbol timeout
//! - [`signal`]: SNR and RSSI read-back
//!
//! Several conversions are lossy by construction (power decode, the
//! millisecond/symbol timeout pair). They reproduce the integer arithmetic of
//! the chip's documented formulas and must not be "corrected".

pub mod modem;
pub mod rf;
pub mod signal;

pub use modem::*;
pub use rf::*;
pub use signal::*;
