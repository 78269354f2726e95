//! Per-model output envelopes.
//!
//! Setpoint writes are checked against these limits before any bytes are put
//! on the wire, so a typo in application code cannot ask a 50V/15A unit for
//! 500V. The device itself clamps out-of-range setpoints, but silently, which
//! is worse than an error.

use crate::register::ProductModel;

/// Output envelope of a DPS model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Maximum output voltage setpoint in millivolts.
    pub max_voltage_mv: u32,
    /// Maximum output current setpoint in milliamps.
    pub max_current_ma: u32,
}

impl DeviceLimits {
    /// Create a new `DeviceLimits` with the given envelope.
    pub const fn new(max_voltage_mv: u32, max_current_ma: u32) -> Self {
        Self {
            max_voltage_mv,
            max_current_ma,
        }
    }

    /// Whether a voltage setpoint is inside the envelope.
    #[inline]
    pub const fn voltage_in_range(&self, voltage_mv: u32) -> bool {
        voltage_mv <= self.max_voltage_mv
    }

    /// Whether a current setpoint is inside the envelope.
    #[inline]
    pub const fn current_in_range(&self, current_ma: u32) -> bool {
        current_ma <= self.max_current_ma
    }
}

impl ProductModel {
    /// Get the output envelope for this product model.
    pub const fn limits(&self) -> DeviceLimits {
        match self {
            ProductModel::Dps3005 => DeviceLimits::new(30_000, 5_000),
            ProductModel::Dps5005 => DeviceLimits::new(50_000, 5_000),
            ProductModel::Dps3012 => DeviceLimits::new(30_000, 12_000),
            ProductModel::Dps5015 => DeviceLimits::new(50_000, 15_000),
            ProductModel::Dps5020 => DeviceLimits::new(50_000, 20_000),
            ProductModel::Dph3205 => DeviceLimits::new(32_000, 5_000),
        }
    }
}
