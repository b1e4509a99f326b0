//! Shared access to one radio
//!
//! A [`Session`] owns a [`Radio`] behind an `embassy-sync` async mutex so it
//! can live in a `static` and be reached from several tasks. Blocking calls
//! only try the lock: while another task holds the radio they fail with
//! [`Error::Busy`] and the readiness queries report `false`, instead of
//! waiting behind a receive that may poll for seconds. Async callers can wait
//! for the radio with [`Session::lock`] or the `_async` transfers.
//!
//! Power and LNA gain requests are clamped to the usable range before being
//! encoded, so callers of the session never see `InvalidParameter` for them.
//!
//! # Example
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use sx127x::{Config, Radio, Session};
//!
//! fn beacon<SPI: SpiDevice, D: DelayNs>(spi: SPI, delay: D) -> Result<usize, sx127x::Error> {
//!     let radio = Radio::new(spi, delay, Config::default())?;
//!     let session: Session<NoopRawMutex, _, _> = Session::new(radio);
//!     session.set_frequency(868_100_000)?;
//!     session.set_power(14)?;
//!     session.write(b"beacon")
//! }
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::registers::IrqFlags;
use crate::{Error, OperatingMode, Radio};

/// Output power range accepted by [`Session::set_power`], in dBm
pub const SESSION_POWER_RANGE: (i32, i32) = (-2, 17);

/// LNA gain range accepted by [`Session::set_lna_gain`], in dB
pub const SESSION_LNA_RANGE: (i32, i32) = (-48, 0);

/// Exclusive access guard around a [`Radio`]
pub struct Session<M: RawMutex, SPI, D> {
    radio: Mutex<M, Radio<SPI, D>>,
}

impl<M: RawMutex, SPI, D> Session<M, SPI, D> {
    /// Wraps an attached radio
    pub fn new(radio: Radio<SPI, D>) -> Self {
        Self {
            radio: Mutex::new(radio),
        }
    }

    /// Gives the radio back
    pub fn into_inner(self) -> Radio<SPI, D> {
        self.radio.into_inner()
    }

    /// Waits until the radio is free and holds it until the guard is dropped
    pub async fn lock(&self) -> MutexGuard<'_, M, Radio<SPI, D>> {
        self.radio.lock().await
    }

    /// Runs `f` with exclusive access to the radio, without waiting.
    ///
    /// # Errors
    /// * `Error::Busy` - another task currently holds the radio
    pub fn with_radio<R>(
        &self,
        f: impl FnOnce(&mut Radio<SPI, D>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut radio = self.radio.try_lock().map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::debug!("radio busy");

            Error::Busy
        })?;
        f(&mut radio)
    }

    /// Whether no task currently holds the radio
    pub fn ready_to_write(&self) -> bool {
        self.radio.try_lock().is_ok()
    }
}

impl<M, SPI, D> Session<M, SPI, D>
where
    M: RawMutex,
    SPI: embedded_hal::spi::SpiDevice,
    D: embedded_hal::delay::DelayNs,
{
    /// Receives one packet, see [`Radio::receive`]
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.with_radio(|radio| radio.receive(buf))
    }

    /// Transmits one packet, see [`Radio::send`]
    pub fn write(&self, payload: &[u8]) -> Result<usize, Error> {
        self.with_radio(|radio| radio.send(payload))
    }
}

impl<M, SPI, D> Session<M, SPI, D>
where
    M: RawMutex,
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Whether the radio is free and holds a received packet
    pub fn ready_to_read(&self) -> bool {
        self.with_radio(|radio| radio.irq_flag(IrqFlags::RX_DONE))
            .is_ok_and(|flags| !flags.is_empty())
    }

    /// Switches the operating mode, see [`Radio::set_mode`]
    pub fn set_mode(&self, mode: OperatingMode) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_mode(mode))
    }

    /// Current operating mode, read back from the chip
    pub fn mode(&self) -> Result<OperatingMode, Error> {
        self.with_radio(|radio| radio.mode())
    }

    /// Sets the carrier frequency in Hz
    pub fn set_frequency(&self, hz: u32) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_frequency(hz))
    }

    /// Carrier frequency in Hz
    pub fn frequency(&self) -> Result<u32, Error> {
        self.with_radio(|radio| radio.frequency())
    }

    /// Sets the output power, clamped to [`SESSION_POWER_RANGE`]
    pub fn set_power(&self, dbm: i32) -> Result<(), Error> {
        let (min, max) = SESSION_POWER_RANGE;
        self.with_radio(|radio| radio.set_power(dbm.clamp(min, max)))
    }

    /// Output power in dBm
    pub fn power(&self) -> Result<i32, Error> {
        self.with_radio(|radio| radio.power())
    }

    /// Sets the LNA gain, clamped to [`SESSION_LNA_RANGE`]
    pub fn set_lna_gain(&self, db: i32) -> Result<(), Error> {
        let (min, max) = SESSION_LNA_RANGE;
        self.with_radio(|radio| radio.set_lna_gain(db.clamp(min, max)))
    }

    /// LNA gain in dB
    pub fn lna_gain(&self) -> Result<i32, Error> {
        self.with_radio(|radio| radio.lna_gain())
    }

    /// Enables or disables the automatic gain control
    pub fn set_agc(&self, enabled: bool) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_agc(enabled))
    }

    /// Whether the automatic gain control is enabled
    pub fn agc(&self) -> Result<bool, Error> {
        self.with_radio(|radio| radio.agc())
    }

    /// Sets the spreading factor in chips per symbol (64 to 2048)
    pub fn set_spreading_factor(&self, chips: u32) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_spreading_factor(chips))
    }

    /// Spreading factor in chips per symbol
    pub fn spreading_factor(&self) -> Result<u32, Error> {
        self.with_radio(|radio| radio.spreading_factor())
    }

    /// Sets the signal bandwidth to the narrowest supported value not below `hz`
    pub fn set_bandwidth(&self, hz: u32) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_bandwidth(hz))
    }

    /// Signal bandwidth in Hz
    pub fn bandwidth(&self) -> Result<u32, Error> {
        self.with_radio(|radio| radio.bandwidth())
    }

    /// Sets the coding rate as numerator and denominator nibbles (`0x45` = 4/5)
    pub fn set_coding_rate(&self, rate: u8) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_coding_rate(rate))
    }

    /// Coding rate as numerator and denominator nibbles
    pub fn coding_rate(&self) -> Result<u8, Error> {
        self.with_radio(|radio| radio.coding_rate())
    }

    /// Selects implicit (true) or explicit (false) header mode
    pub fn set_implicit_header(&self, enabled: bool) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_implicit_header(enabled))
    }

    /// Whether implicit header mode is selected
    pub fn implicit_header(&self) -> Result<bool, Error> {
        self.with_radio(|radio| radio.implicit_header())
    }

    /// Enables or disables the payload CRC
    pub fn set_crc(&self, enabled: bool) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_crc(enabled))
    }

    /// Whether the payload CRC is enabled
    pub fn crc(&self) -> Result<bool, Error> {
        self.with_radio(|radio| radio.crc())
    }

    /// Sets the preamble length in symbols
    pub fn set_preamble_length(&self, length: u16) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_preamble_length(length))
    }

    /// Preamble length in symbols
    pub fn preamble_length(&self) -> Result<u16, Error> {
        self.with_radio(|radio| radio.preamble_length())
    }

    /// Sets the receive timeout in symbols, clamped to 1..=1023
    pub fn set_rx_symbol_timeout(&self, symbols: u32) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_rx_symbol_timeout(symbols))
    }

    /// Receive timeout in symbols
    pub fn rx_symbol_timeout(&self) -> Result<u16, Error> {
        self.with_radio(|radio| radio.rx_symbol_timeout())
    }

    /// Sets the receive timeout in milliseconds
    pub fn set_rx_timeout_ms(&self, ms: u32) -> Result<(), Error> {
        self.with_radio(|radio| radio.set_rx_timeout_ms(ms))
    }

    /// Receive timeout in milliseconds
    pub fn rx_timeout_ms(&self) -> Result<u32, Error> {
        self.with_radio(|radio| radio.rx_timeout_ms())
    }

    /// SNR of the last packet in dB
    pub fn packet_snr(&self) -> Result<i32, Error> {
        self.with_radio(|radio| radio.packet_snr())
    }

    /// Current channel RSSI in dBm
    pub fn rssi(&self) -> Result<i32, Error> {
        self.with_radio(|radio| radio.rssi())
    }

    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&self) -> Result<i32, Error> {
        self.with_radio(|radio| radio.packet_rssi())
    }
}

impl<M, SPI, D> Session<M, SPI, D>
where
    M: RawMutex,
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Waits for the radio, then receives one packet, see [`Radio::receive_async`]
    pub async fn read_async(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.radio.lock().await.receive_async(buf).await
    }

    /// Waits for the radio, then transmits one packet, see [`Radio::send_async`]
    pub async fn write_async(&self, payload: &[u8]) -> Result<usize, Error> {
        self.radio.lock().await.send_async(payload).await
    }
}
