#![cfg_attr(not(test), no_std)]
//! SX127x LoRa Radio Driver
//!
//! This crate drives the Semtech SX1276/77/78/79 sub-GHz transceivers in LoRa
//! mode over SPI. The chip is polled: packet events are discovered by reading
//! the interrupt flag register at a fixed cadence, no DIO line is required.
//!
//! # Features
//! - Frequency range: 137-1020 MHz (band depends on the part)
//! - LoRa modulation: SF6-11 configurable, BW 7.8-500 kHz, CR 4/5-4/8
//! - Output power: -3 to +17 dBm on RFO/PA_BOOST
//! - Explicit or implicit header, optional payload CRC
//! - Blocking (`embedded-hal`) and async (`embedded-hal-async`) data path
//!
//! # Architecture
//! - [`device`]: register transport over an SPI device
//! - [`registers`]: typed definitions of the LoRa register map
//! - [`codec`]: conversions between physical units and register fields
//! - [`mode`]: operating mode control
//! - [`irq`]: interrupt flag access
//! - [`packet`]: polled receive and transmit, signal quality
//! - [`radio`]: the [`Radio`] handle, attach/detach and parameter access
//! - [`session`]: mutex-guarded [`Session`] for sharing one radio
//!
//! # Usage
//! Attaching probes the silicon version, switches the chip to LoRa, and
//! leaves it listening in continuous receive mode. Parameters can then be
//! changed in any order; send and receive both return the chip to continuous
//! receive when they are done.
//!
//! # Important Notes
//! - The LoRa modem can only be selected in Sleep mode
//! - The chip leaves Tx on its own, so the mode is always re-read
//! - The RSSI offset depends on the low frequency register bank bit
//! - Set the crystal frequency in [`Config`] if the board does not use 32 MHz
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use sx127x::{Config, Error, Radio};
//!
//! fn echo<SPI: SpiDevice, D: DelayNs>(spi: SPI, delay: D) -> Result<(), Error> {
//!     let mut radio = Radio::new(spi, delay, Config::default())?;
//!     radio.set_frequency(868_100_000)?;
//!     radio.set_spreading_factor(128)?;
//!     radio.set_bandwidth(125_000)?;
//!
//!     let mut buf = [0u8; 255];
//!     let len = radio.receive(&mut buf)?;
//!     radio.send(&buf[..len])?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod irq;
pub mod mode;
pub mod packet;
pub mod radio;
pub mod registers;
pub mod session;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use device::Device;
pub use error::{Error, TransportError};
pub use mode::{ModeStatus, OperatingMode};
pub use radio::Radio;
pub use registers::*;
pub use session::Session;
