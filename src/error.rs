//! Driver error type

use regiface::errors::Error as RegifaceError;

/// Register transport failure as reported by the [`Device`](crate::Device)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// SPI communication failed
    Bus,
    /// A register value read from the chip could not be parsed
    Deserialization,
}

/// Errors returned by the SX127x driver.
///
/// Transport failures are passed through untouched from the register layer.
/// The packet data path classifies polled IRQ conditions into exactly one of
/// [`Error::NoData`], [`Error::Timeout`] or [`Error::MalformedPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Register transport failed
    Transport(TransportError),
    /// Version probe returned an implausible value (0x00 or 0xFF)
    DeviceAbsent(u8),
    /// Receive window elapsed with nothing pending
    NoData,
    /// An explicit timeout was observed while waiting for the chip
    Timeout,
    /// Payload CRC check failed
    MalformedPayload,
    /// Value is outside the representable domain of its register field
    InvalidParameter,
    /// The session holding the chip is already in use
    Busy,
}

impl From<RegifaceError> for Error {
    fn from(err: RegifaceError) -> Self {
        match err {
            RegifaceError::DeserializationError => Self::Transport(TransportError::Deserialization),
            _ => Self::Transport(TransportError::Bus),
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
