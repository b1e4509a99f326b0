//! SX127x Register Transport
//!
//! This module provides the register-level interface to SX127x series radio
//! devices over SPI. It supports both synchronous and asynchronous operation.
//!
//! Every SPI access starts with one address byte. Bit 7 of that byte selects
//! the direction (1 = write, 0 = read) and the following bytes are data.
//! Multi-byte accesses auto-increment the register address, except on the
//! FIFO register where they walk the FIFO through its address pointer.
//!
//! The interface is built around the `Device<SPI>` struct which provides:
//! - Typed register reads and writes
//! - Read-modify-write of registers that share a byte between fields
//! - Burst access to the FIFO
//!
//! # Example
//! ```no_run
//! use embedded_hal::spi::SpiDevice;
//! use sx127x::{Device, registers::Version};
//!
//! fn probe<SPI: SpiDevice>(spi: SPI) -> Result<u8, sx127x::Error> {
//!     let mut device = Device::new(spi);
//!     let version: Version = device.read_register()?;
//!     Ok(version.value)
//! }
//! ```

use core::convert::Infallible;

use regiface::{
    errors::Error as RegifaceError, ByteArray, ReadableRegister, ToByteArray,
    WritableRegister,
};

use crate::registers::FIFO_ADDRESS;

const WRITE_FLAG: u8 = 0x80;
const ADDRESS_MASK: u8 = 0x7F;

/// Register interface for the SX127x radio.
///
/// This struct wraps an SPI interface and provides methods to interact with the
/// chip's register file. It supports both synchronous operations through the
/// embedded-hal traits and asynchronous operations through embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI interface implementing the required embedded-hal traits
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    ///
    /// This method consumes the Device instance and returns the wrapped SPI interface.
    pub fn release(self) -> SPI {
        self.spi
    }
}

fn serialize<R>(register: R) -> R::Array
where
    R: ToByteArray<Error = Infallible>,
{
    match register.to_bytes() {
        Ok(raw_value) => raw_value,
        Err(never) => match never {},
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads `bytes.len()` bytes starting at register `address`.
    ///
    /// # Returns
    /// Number of bytes transferred
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read_burst(&mut self, address: u8, bytes: &mut [u8]) -> Result<usize, RegifaceError> {
        let len = bytes.len();

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address & ADDRESS_MASK]),
                embedded_hal::spi::Operation::Read(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)?;

        Ok(len)
    }

    /// Writes `bytes` starting at register `address`.
    ///
    /// # Returns
    /// Number of bytes transferred
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_burst(&mut self, address: u8, bytes: &[u8]) -> Result<usize, RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address | WRITE_FLAG]),
                embedded_hal::spi::Operation::Write(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)?;

        Ok(bytes.len())
    }

    /// Reads a register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    /// * `RegifaceError::DeserializationError` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();
        self.read_burst(R::id(), raw_value.as_mut())?;

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Writes a value to a device register.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = serialize(register);
        self.write_burst(R::id(), raw_value.as_ref())?;
        Ok(())
    }

    /// Read-modify-write of a register.
    ///
    /// Reads the current value, lets `update` change the fields it owns and
    /// writes the result back, so bits belonging to other fields keep the
    /// value the chip holds.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    /// * `RegifaceError::DeserializationError` - Failed to parse register value
    pub fn modify_register<R, F>(&mut self, update: F) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8> + WritableRegister<IdType = u8, Error = Infallible> + Copy,
        F: FnOnce(&mut R),
    {
        let mut register: R = self.read_register()?;
        update(&mut register);
        self.write_register(register)?;
        Ok(register)
    }

    /// Reads bytes from the FIFO at the current FIFO address pointer.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read_fifo(&mut self, bytes: &mut [u8]) -> Result<usize, RegifaceError> {
        self.read_burst(FIFO_ADDRESS, bytes)
    }

    /// Writes bytes into the FIFO at the current FIFO address pointer.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_fifo(&mut self, bytes: &[u8]) -> Result<usize, RegifaceError> {
        self.write_burst(FIFO_ADDRESS, bytes)
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously reads a burst of registers.
    ///
    /// This is the async version of [`read_burst`](Device::read_burst).
    pub async fn read_burst_async(
        &mut self,
        address: u8,
        bytes: &mut [u8],
    ) -> Result<usize, RegifaceError> {
        let len = bytes.len();

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[address & ADDRESS_MASK]),
                embedded_hal_async::spi::Operation::Read(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)?;

        Ok(len)
    }

    /// Asynchronously writes a burst of registers.
    ///
    /// This is the async version of [`write_burst`](Device::write_burst).
    pub async fn write_burst_async(
        &mut self,
        address: u8,
        bytes: &[u8],
    ) -> Result<usize, RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[address | WRITE_FLAG]),
                embedded_hal_async::spi::Operation::Write(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)?;

        Ok(bytes.len())
    }

    /// Asynchronously reads a register value from the device.
    ///
    /// This is the async version of [`read_register`](Device::read_register).
    pub async fn read_register_async<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();
        self.read_burst_async(R::id(), raw_value.as_mut()).await?;

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Asynchronously writes a value to a device register.
    ///
    /// This is the async version of [`write_register`](Device::write_register).
    pub async fn write_register_async<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = serialize(register);
        self.write_burst_async(R::id(), raw_value.as_ref()).await?;
        Ok(())
    }

    /// Asynchronous read-modify-write of a register.
    ///
    /// This is the async version of [`modify_register`](Device::modify_register).
    pub async fn modify_register_async<R, F>(&mut self, update: F) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8> + WritableRegister<IdType = u8, Error = Infallible> + Copy,
        F: FnOnce(&mut R),
    {
        let mut register: R = self.read_register_async().await?;
        update(&mut register);
        self.write_register_async(register).await?;
        Ok(register)
    }

    /// Asynchronously reads bytes from the FIFO.
    ///
    /// This is the async version of [`read_fifo`](Device::read_fifo).
    pub async fn read_fifo_async(&mut self, bytes: &mut [u8]) -> Result<usize, RegifaceError> {
        self.read_burst_async(FIFO_ADDRESS, bytes).await
    }

    /// Asynchronously writes bytes into the FIFO.
    ///
    /// This is the async version of [`write_fifo`](Device::write_fifo).
    pub async fn write_fifo_async(&mut self, bytes: &[u8]) -> Result<usize, RegifaceError> {
        self.write_burst_async(FIFO_ADDRESS, bytes).await
    }
}
