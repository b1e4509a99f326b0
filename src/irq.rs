//! Interrupt flag access
//!
//! RegIrqFlags is write-1-to-clear. Clearing writes exactly the requested mask,
//! so flags outside the mask that are raised in between stay pending.

use crate::registers::{IrqFlags, IrqFlagsRegister};
use crate::{Error, Radio};

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads all pending interrupt flags
    pub fn irq_flags(&mut self) -> Result<IrqFlags, Error> {
        let register: IrqFlagsRegister = self.device.read_register()?;
        Ok(register.flags)
    }

    /// Reads the pending interrupt flags selected by `mask`
    pub fn irq_flag(&mut self, mask: IrqFlags) -> Result<IrqFlags, Error> {
        Ok(self.irq_flags()? & mask)
    }

    /// Clears the interrupt flags selected by `mask`
    pub fn clear_irq(&mut self, mask: IrqFlags) -> Result<(), Error> {
        self.device.write_register(IrqFlagsRegister { flags: mask })?;
        Ok(())
    }

    /// Clears every interrupt flag
    pub fn clear_all_irq(&mut self) -> Result<(), Error> {
        self.clear_irq(IrqFlags::all())
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Async version of [`irq_flags`](Radio::irq_flags).
    pub async fn irq_flags_async(&mut self) -> Result<IrqFlags, Error> {
        let register: IrqFlagsRegister = self.device.read_register_async().await?;
        Ok(register.flags)
    }

    /// Async version of [`irq_flag`](Radio::irq_flag).
    pub async fn irq_flag_async(&mut self, mask: IrqFlags) -> Result<IrqFlags, Error> {
        Ok(self.irq_flags_async().await? & mask)
    }

    /// Async version of [`clear_irq`](Radio::clear_irq).
    pub async fn clear_irq_async(&mut self, mask: IrqFlags) -> Result<(), Error> {
        self.device
            .write_register_async(IrqFlagsRegister { flags: mask })
            .await?;
        Ok(())
    }

    /// Async version of [`clear_all_irq`](Radio::clear_all_irq).
    pub async fn clear_all_irq_async(&mut self) -> Result<(), Error> {
        self.clear_irq_async(IrqFlags::all()).await
    }
}
