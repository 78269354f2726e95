//! Our error types for the DPS PSUs.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for DPS PSU communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Modbus protocol error: {0}")]
    ModbusError(rmodbus::ErrorKind),
    #[error("Communication timeout")]
    Timeout,
    #[error("Value outside the device's output envelope")]
    OutOfRange,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Frame larger than the client buffer")]
    BufferError,
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Error<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        Error::ModbusError(err)
    }
}
