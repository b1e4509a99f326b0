//! Operating mode control
//!
//! The mode lives in the low three bits of RegOpMode, next to the modem
//! selection and the frequency band bits. The chip changes mode on its own
//! (TX falls back to Standby once the packet is out), so nothing here caches
//! it: every query is a register read.

use crate::registers::OpMode;
use crate::{Error, Radio};

/// Transceiver operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
    /// Lowest power, configuration retained; modem selection only changes here
    Sleep = 0,
    /// Crystal and LDO on, RF blocks off
    Standby = 1,
    /// Frequency synthesis for transmit
    FsTx = 2,
    /// Transmitting the FIFO payload, returns to Standby when done
    Tx = 3,
    /// Frequency synthesis for receive
    FsRx = 4,
    /// Listening until told otherwise
    RxContinuous = 5,
    /// Listening for one packet or until the symbol timeout
    RxSingle = 6,
    /// Channel activity detection
    Cad = 7,
}

impl From<u8> for OperatingMode {
    fn from(value: u8) -> Self {
        match value & 0x07 {
            0 => Self::Sleep,
            1 => Self::Standby,
            2 => Self::FsTx,
            3 => Self::Tx,
            4 => Self::FsRx,
            5 => Self::RxContinuous,
            6 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// Decoded content of RegOpMode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeStatus {
    /// Operating mode field
    pub mode: OperatingMode,
    /// LoRa modem selected
    pub lora: bool,
    /// Low frequency register bank selected, moves the RSSI offset
    pub low_frequency: bool,
}

impl From<OpMode> for ModeStatus {
    fn from(register: OpMode) -> Self {
        Self {
            mode: register.mode().into(),
            lora: register.long_range_mode(),
            low_frequency: register.low_frequency_mode(),
        }
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Switches the operating mode, leaving the other RegOpMode bits untouched.
    ///
    /// # Errors
    /// * `Error::Transport` - SPI communication failed
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("set mode {}", mode);

        self.device
            .modify_register::<OpMode, _>(|op_mode| op_mode.set_mode(mode as u8))?;
        Ok(())
    }

    /// Reads the full mode status from the chip
    pub fn mode_status(&mut self) -> Result<ModeStatus, Error> {
        let op_mode: OpMode = self.device.read_register()?;
        Ok(op_mode.into())
    }

    /// Reads the current operating mode from the chip
    pub fn mode(&mut self) -> Result<OperatingMode, Error> {
        Ok(self.mode_status()?.mode)
    }

    /// Selects the LoRa modem.
    ///
    /// LongRangeMode is only writable in Sleep, so the chip is put to sleep,
    /// the bit is set, and the chip is brought back to Standby.
    pub fn enable_lora(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Sleep)?;
        self.device
            .modify_register::<OpMode, _>(|op_mode| op_mode.set_long_range_mode(true))?;
        self.set_mode(OperatingMode::Standby)
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Async version of [`set_mode`](Radio::set_mode).
    pub async fn set_mode_async(&mut self, mode: OperatingMode) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("set mode {}", mode);

        self.device
            .modify_register_async::<OpMode, _>(|op_mode| op_mode.set_mode(mode as u8))
            .await?;
        Ok(())
    }

    /// Async version of [`mode_status`](Radio::mode_status).
    pub async fn mode_status_async(&mut self) -> Result<ModeStatus, Error> {
        let op_mode: OpMode = self.device.read_register_async().await?;
        Ok(op_mode.into())
    }

    /// Async version of [`mode`](Radio::mode).
    pub async fn mode_async(&mut self) -> Result<OperatingMode, Error> {
        Ok(self.mode_status_async().await?.mode)
    }

    /// Async version of [`enable_lora`](Radio::enable_lora).
    pub async fn enable_lora_async(&mut self) -> Result<(), Error> {
        self.set_mode_async(OperatingMode::Sleep).await?;
        self.device
            .modify_register_async::<OpMode, _>(|op_mode| op_mode.set_long_range_mode(true))
            .await?;
        self.set_mode_async(OperatingMode::Standby).await
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::mock::{self, REG_OP_MODE};
    use crate::Config;

    #[test]
    fn mode_field_decodes_every_value() {
        assert_eq!(OperatingMode::from(0), OperatingMode::Sleep);
        assert_eq!(OperatingMode::from(5), OperatingMode::RxContinuous);
        assert_eq!(OperatingMode::from(7), OperatingMode::Cad);
        // upper bits belong to other fields
        assert_eq!(OperatingMode::from(0x8B), OperatingMode::Tx);
    }

    #[test]
    fn mode_status_splits_op_mode() {
        let status = ModeStatus::from(OpMode { value: 0x8D });
        assert_eq!(status.mode, OperatingMode::RxContinuous);
        assert!(status.lora);
        assert!(status.low_frequency);
    }

    #[test]
    fn set_mode_keeps_other_bits() {
        let (chip, spi, delay) = mock::chip();
        let mut radio = Radio::new(spi, delay, Config::default()).unwrap();
        assert_eq!(chip.borrow().register(REG_OP_MODE), 0x8D);

        radio.set_mode(OperatingMode::Standby).unwrap();
        assert_eq!(chip.borrow().register(REG_OP_MODE), 0x89);
        assert_eq!(radio.mode().unwrap(), OperatingMode::Standby);
    }

    #[test]
    fn mode_is_reread_after_chip_transition() {
        let (chip, spi, delay) = mock::chip();
        let mut radio = Radio::new(spi, delay, Config::default()).unwrap();

        chip.borrow_mut().set_register(REG_OP_MODE, 0x81);
        assert_eq!(radio.mode().unwrap(), OperatingMode::Standby);
    }

    #[test]
    fn lora_bit_is_set_while_asleep() {
        let (chip, spi, delay) = mock::chip();
        let mut radio = Radio::new(spi, delay, Config::default()).unwrap();
        radio.set_mode(OperatingMode::Sleep).unwrap();
        chip.borrow_mut().set_register(REG_OP_MODE, 0x08);
        chip.borrow_mut().op_mode_writes.clear();

        radio.enable_lora().unwrap();

        assert_eq!(chip.borrow().op_mode_writes, [0x08, 0x88, 0x89]);
        assert!(radio.mode_status().unwrap().lora);
    }

    #[test]
    fn async_mode_round_trip() {
        let (chip, spi, delay) = mock::chip();
        let mut radio = Radio::new(spi, delay, Config::default()).unwrap();

        block_on(radio.set_mode_async(OperatingMode::Sleep)).unwrap();
        assert_eq!(chip.borrow().mode(), 0);
        assert_eq!(block_on(radio.mode_async()).unwrap(), OperatingMode::Sleep);
    }
}
