//! This crate provides an interface for communicating with and controlling the RDTech DPS series of programmable buck power supplies.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag.
//!
//! PSU models covered:
//! * DPS3005
//! * DPS5005
//! * DPS3012
//! * DPS5015
//! * DPS5020
//! * DPH3205
//!
//! It uses Modbus RTU under the hood, and is suitable for interfacing with the DPS units over serial/UART or RS485,
//! typically via the TTL header on the back of the display board.
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! The `sim` feature exposes [`sim::SimulatedDps`], a software stand-in which answers Modbus
//! requests like a real DPS5015, so applications can be developed with no power supply attached.

#![cfg_attr(feature = "no_std", no_std)]

pub mod error;
pub mod limits;
pub mod psu;
pub mod register;
pub mod scaling;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(test)]
mod mock_serial;
