//! Chip handle
//!
//! [`Radio`] owns the register transport, the delay provider used while
//! polling for packet events, and the platform [`Config`]. It is created by
//! probing and initializing the chip, so a `Radio` value always refers to a
//! responding SX127x in LoRa mode.
//!
//! Parameter accessors convert between physical units and register fields
//! with the [`codec`](crate::codec) functions. Setters of fields sharing a
//! byte with other configuration go through
//! [`Device::modify_register`](crate::Device::modify_register) and leave the
//! neighbouring bits as the chip holds them.

use crate::codec::{
    clamp_symbol_timeout, decode_bandwidth, decode_coding_rate, decode_frequency,
    decode_lna_gain, decode_power, decode_spreading_factor, encode_bandwidth, encode_coding_rate,
    encode_frequency, encode_lna_gain, encode_power, encode_spreading_factor, join_symbol_timeout,
    split_symbol_timeout, timeout_ms_to_symbols, timeout_symbols_to_ms, PowerCode,
};
use crate::registers::{
    FifoAddrPtr, FifoRxBaseAddr, Frequency, Lna, MaxPayloadLength, ModemConfig1, ModemConfig2,
    ModemConfig3, PaConfig, PreambleLength, SymbTimeoutLsb, Version,
};
use crate::{Config, Device, Error, OperatingMode};

/// SX127x radio in LoRa mode
pub struct Radio<SPI, D> {
    pub(crate) device: Device<SPI>,
    pub(crate) delay: D,
    pub(crate) config: Config,
    version: Version,
}

impl<SPI, D> Radio<SPI, D> {
    fn from_parts(spi: SPI, delay: D, config: Config) -> Self {
        Self {
            device: Device::new(spi),
            delay,
            config,
            version: Version { value: 0 },
        }
    }

    /// Platform configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Silicon version read while attaching
    pub fn version(&self) -> Version {
        self.version
    }

    /// Raw register access, bypassing the parameter codecs
    pub fn device_mut(&mut self) -> &mut Device<SPI> {
        &mut self.device
    }

    /// Releases the SPI device and delay without touching the chip
    pub fn release(self) -> (SPI, D) {
        (self.device.release(), self.delay)
    }
}

fn check_version(version: Version) -> Result<Version, Error> {
    match version.value {
        0x00 | 0xFF => {
            #[cfg(feature = "defmt")]
            defmt::warn!("no SX127x answering, version {=u8:#x}", version.value);

            Err(Error::DeviceAbsent(version.value))
        }
        _ => {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "SX127x version {=u8:#x}, revision {=u8} metal mask {=u8}",
                version.value,
                version.full_revision(),
                version.metal_mask()
            );

            Ok(version)
        }
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: embedded_hal::delay::DelayNs,
{
    /// Attaches to a chip.
    ///
    /// Probes the version register, selects the LoRa modem, switches to
    /// explicit header mode, points the FIFO at the RX base, clears every
    /// interrupt flag and starts continuous reception.
    ///
    /// # Errors
    /// * `Error::DeviceAbsent` - version register reads 0x00 or 0xFF
    /// * `Error::Transport` - SPI communication failed
    pub fn new(spi: SPI, delay: D, config: Config) -> Result<Self, Error> {
        let mut radio = Self::from_parts(spi, delay, config);
        radio.version = check_version(radio.read_version()?)?;
        radio.init()?;
        Ok(radio)
    }

    fn init(&mut self) -> Result<(), Error> {
        self.enable_lora()?;
        self.set_implicit_header(false)?;
        self.device.write_register(FifoRxBaseAddr {
            addr: self.config.rx_base_addr,
        })?;
        self.device.write_register(FifoAddrPtr {
            addr: self.config.rx_base_addr,
        })?;
        self.clear_all_irq()?;
        self.set_mode(OperatingMode::RxContinuous)
    }

    /// Puts the chip to sleep and releases the SPI device and delay.
    ///
    /// The peripherals are returned even if the chip does not acknowledge.
    pub fn detach(mut self) -> (SPI, D) {
        if let Err(_err) = self.set_mode(OperatingMode::Sleep) {
            #[cfg(feature = "defmt")]
            defmt::warn!("sleep on detach failed: {}", _err);
        }
        self.release()
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`new`](Radio::new).
    pub async fn new_async(spi: SPI, delay: D, config: Config) -> Result<Self, Error> {
        let mut radio = Self::from_parts(spi, delay, config);
        let version: Version = radio.device.read_register_async().await?;
        radio.version = check_version(version)?;
        radio.init_async().await?;
        Ok(radio)
    }

    async fn init_async(&mut self) -> Result<(), Error> {
        self.enable_lora_async().await?;
        self.device
            .modify_register_async::<ModemConfig1, _>(|config| config.set_implicit_header(false))
            .await?;
        self.device
            .write_register_async(FifoRxBaseAddr {
                addr: self.config.rx_base_addr,
            })
            .await?;
        self.device
            .write_register_async(FifoAddrPtr {
                addr: self.config.rx_base_addr,
            })
            .await?;
        self.clear_all_irq_async().await?;
        self.set_mode_async(OperatingMode::RxContinuous).await
    }

    /// Async version of [`detach`](Radio::detach).
    pub async fn detach_async(mut self) -> (SPI, D) {
        if let Err(_err) = self.set_mode_async(OperatingMode::Sleep).await {
            #[cfg(feature = "defmt")]
            defmt::warn!("sleep on detach failed: {}", _err);
        }
        self.release()
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads the silicon version register
    pub fn read_version(&mut self) -> Result<Version, Error> {
        Ok(self.device.read_register()?)
    }

    /// Sets the carrier frequency in Hz.
    ///
    /// The three Frf bytes are written in one burst; the chip latches the new
    /// frequency on the last byte.
    ///
    /// # Errors
    /// * `Error::InvalidParameter` - frequency does not fit in the 24-bit Frf
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        let value = encode_frequency(hz, self.config.crystal_hz)?;
        self.device.write_register(Frequency { value })?;
        Ok(())
    }

    /// Carrier frequency in Hz
    pub fn frequency(&mut self) -> Result<u32, Error> {
        let frf: Frequency = self.device.read_register()?;
        Ok(decode_frequency(frf.value, self.config.crystal_hz))
    }

    /// Sets the output power in dBm, selecting PA_BOOST above 15 dBm.
    ///
    /// Rewrites the whole PA configuration register.
    ///
    /// # Errors
    /// * `Error::InvalidParameter` - `dbm` outside -3 to 17
    pub fn set_power(&mut self, dbm: i32) -> Result<(), Error> {
        let code = encode_power(dbm)?;
        self.device.write_register(code.to_register())?;
        Ok(())
    }

    /// Output power in dBm
    pub fn power(&mut self) -> Result<i32, Error> {
        let pa_config: PaConfig = self.device.read_register()?;
        Ok(decode_power(PowerCode::from_register(pa_config)))
    }

    /// Selects the PA_BOOST (true) or RFO (false) output
    pub fn set_boost(&mut self, enabled: bool) -> Result<(), Error> {
        self.device
            .modify_register::<PaConfig, _>(|pa_config| pa_config.set_boost(enabled))?;
        Ok(())
    }

    /// Whether the PA_BOOST output is selected
    pub fn boost(&mut self) -> Result<bool, Error> {
        let pa_config: PaConfig = self.device.read_register()?;
        Ok(pa_config.boost())
    }

    /// Sets the LNA gain in dB, rounded down to the next available step
    pub fn set_lna_gain(&mut self, db: i32) -> Result<(), Error> {
        let step = encode_lna_gain(db);
        self.device.modify_register::<Lna, _>(|lna| lna.set_gain(step))?;
        Ok(())
    }

    /// LNA gain in dB
    ///
    /// # Errors
    /// * `Error::InvalidParameter` - the chip holds a reserved gain step
    pub fn lna_gain(&mut self) -> Result<i32, Error> {
        let lna: Lna = self.device.read_register()?;
        decode_lna_gain(lna.gain())
    }

    /// Hands LNA gain control to the AGC loop (true) or to RegLna (false)
    pub fn set_agc(&mut self, enabled: bool) -> Result<(), Error> {
        self.device
            .modify_register::<ModemConfig3, _>(|config| config.set_agc_auto_on(enabled))?;
        Ok(())
    }

    /// Whether the AGC loop controls the LNA gain
    pub fn agc(&mut self) -> Result<bool, Error> {
        let config: ModemConfig3 = self.device.read_register()?;
        Ok(config.agc_auto_on())
    }

    /// Sets the spreading factor as chips per symbol (64 to 2048)
    pub fn set_spreading_factor(&mut self, chips: u32) -> Result<(), Error> {
        let sf = encode_spreading_factor(chips)?;
        self.device
            .modify_register::<ModemConfig2, _>(|config| config.set_spreading_factor(sf))?;
        Ok(())
    }

    /// Spreading factor as chips per symbol
    pub fn spreading_factor(&mut self) -> Result<u32, Error> {
        let config: ModemConfig2 = self.device.read_register()?;
        Ok(decode_spreading_factor(config.spreading_factor()))
    }

    /// Sets the signal bandwidth to the narrowest supported value not below `hz`
    pub fn set_bandwidth(&mut self, hz: u32) -> Result<(), Error> {
        let index = encode_bandwidth(hz);
        self.device
            .modify_register::<ModemConfig1, _>(|config| config.set_bandwidth(index))?;
        Ok(())
    }

    /// Signal bandwidth in Hz
    pub fn bandwidth(&mut self) -> Result<u32, Error> {
        let config: ModemConfig1 = self.device.read_register()?;
        decode_bandwidth(config.bandwidth())
    }

    /// Sets the coding rate, given as numerator and denominator nibbles (`0x45` = 4/5)
    pub fn set_coding_rate(&mut self, rate: u8) -> Result<(), Error> {
        let field = encode_coding_rate(rate)?;
        self.device
            .modify_register::<ModemConfig1, _>(|config| config.set_coding_rate(field))?;
        Ok(())
    }

    /// Coding rate as numerator and denominator nibbles
    pub fn coding_rate(&mut self) -> Result<u8, Error> {
        let config: ModemConfig1 = self.device.read_register()?;
        Ok(decode_coding_rate(config.coding_rate()))
    }

    /// Enables (true) or disables (false) implicit header mode
    pub fn set_implicit_header(&mut self, enabled: bool) -> Result<(), Error> {
        self.device
            .modify_register::<ModemConfig1, _>(|config| config.set_implicit_header(enabled))?;
        Ok(())
    }

    /// Whether implicit header mode is enabled
    pub fn implicit_header(&mut self) -> Result<bool, Error> {
        let config: ModemConfig1 = self.device.read_register()?;
        Ok(config.implicit_header())
    }

    /// Enables (true) or disables (false) payload CRC
    pub fn set_crc(&mut self, enabled: bool) -> Result<(), Error> {
        self.device
            .modify_register::<ModemConfig2, _>(|config| config.set_rx_payload_crc_on(enabled))?;
        Ok(())
    }

    /// Whether payload CRC is enabled
    pub fn crc(&mut self) -> Result<bool, Error> {
        let config: ModemConfig2 = self.device.read_register()?;
        Ok(config.rx_payload_crc_on())
    }

    /// Sets the preamble length in symbols
    pub fn set_preamble_length(&mut self, length: u16) -> Result<(), Error> {
        self.device.write_register(PreambleLength { length })?;
        Ok(())
    }

    /// Preamble length in symbols
    pub fn preamble_length(&mut self) -> Result<u16, Error> {
        let preamble: PreambleLength = self.device.read_register()?;
        Ok(preamble.length)
    }

    /// Sets the RX single timeout in symbols, clamped to 1..=1023
    pub fn set_rx_symbol_timeout(&mut self, symbols: u32) -> Result<(), Error> {
        let (msb, lsb) = split_symbol_timeout(clamp_symbol_timeout(symbols));
        self.device
            .modify_register::<ModemConfig2, _>(|config| config.set_symb_timeout_msb(msb))?;
        self.device.write_register(SymbTimeoutLsb { value: lsb })?;
        Ok(())
    }

    /// RX single timeout in symbols
    pub fn rx_symbol_timeout(&mut self) -> Result<u16, Error> {
        let config: ModemConfig2 = self.device.read_register()?;
        let lsb: SymbTimeoutLsb = self.device.read_register()?;
        Ok(join_symbol_timeout(config.symb_timeout_msb(), lsb.value))
    }

    /// Sets the RX single timeout in milliseconds.
    ///
    /// Converted with the current bandwidth and spreading factor, so those
    /// should be configured first.
    pub fn set_rx_timeout_ms(&mut self, ms: u32) -> Result<(), Error> {
        let bandwidth = self.bandwidth()?;
        let chips = self.spreading_factor()?;
        self.set_rx_symbol_timeout(timeout_ms_to_symbols(ms, bandwidth, chips))
    }

    /// RX single timeout in milliseconds, truncated
    pub fn rx_timeout_ms(&mut self) -> Result<u32, Error> {
        let symbols = self.rx_symbol_timeout()?;
        let bandwidth = self.bandwidth()?;
        let chips = self.spreading_factor()?;
        Ok(timeout_symbols_to_ms(u32::from(symbols), bandwidth, chips))
    }

    /// Sets the largest payload the receiver accepts
    pub fn set_max_payload_length(&mut self, length: u8) -> Result<(), Error> {
        self.device.write_register(MaxPayloadLength { length })?;
        Ok(())
    }

    /// Largest payload the receiver accepts
    pub fn max_payload_length(&mut self) -> Result<u8, Error> {
        let max: MaxPayloadLength = self.device.read_register()?;
        Ok(max.length)
    }
}
