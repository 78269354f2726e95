//! Scaling factors for different PSU models
//!
//! Every DPS model encodes voltage and current as centi-units, but the power
//! readback register changes unit with the output rating: the 5A units report
//! centi-watts while the 12A/15A/20A units report deci-watts. This module
//! defines the scaling factors for each model.

use crate::register::ProductModel;

/// Scaling factors for converting raw register values to milli-units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingFactors {
    /// Multiplier for voltage values (10 means raw value is in centivolts, multiply by 10 to get mV)
    pub voltage_divisor: u32,
    /// Multiplier for current values (10 means raw value is in centiamps, multiply by 10 to get mA)
    pub current_divisor: u32,
    /// Multiplier for power values (100 means raw value is in deciwatts, multiply by 100 to get mW)
    pub power_divisor: u32,
}

impl Default for ScalingFactors {
    /// Default to no scaling.
    fn default() -> Self {
        Self {
            voltage_divisor: 1,
            current_divisor: 1,
            power_divisor: 1,
        }
    }
}

impl ScalingFactors {
    /// Create a new `ScalingFactors` instance with the specified divisor values.
    ///
    /// # Arguments
    ///
    /// * `voltage_divisor` - Multiplier for voltage values (raw to mV).
    /// * `current_divisor` - Multiplier for current values (raw to mA).
    /// * `power_divisor` - Multiplier for power values (raw to mW).
    pub const fn new(voltage_divisor: u32, current_divisor: u32, power_divisor: u32) -> Self {
        Self {
            voltage_divisor,
            current_divisor,
            power_divisor,
        }
    }

    /// Convert raw voltage register value to millivolts
    ///
    /// If divisor is 10, raw is in centivolts (10mV units), so we multiply by 10.
    #[inline]
    pub const fn raw_to_voltage_mv(&self, raw: u16) -> u32 {
        (raw as u32) * self.voltage_divisor
    }

    /// Convert millivolts to raw voltage register value
    #[inline]
    pub const fn voltage_mv_to_raw(&self, voltage_mv: u32) -> u16 {
        (voltage_mv / self.voltage_divisor) as u16
    }

    /// Convert raw current register value to milliamps
    ///
    /// If divisor is 10, raw is in centiamps (10mA units), so we multiply by 10.
    #[inline]
    pub const fn raw_to_current_ma(&self, raw: u16) -> u32 {
        (raw as u32) * self.current_divisor
    }

    /// Convert milliamps to raw current register value
    #[inline]
    pub const fn current_ma_to_raw(&self, current_ma: u32) -> u16 {
        (current_ma / self.current_divisor) as u16
    }

    /// Convert raw power register value to milliwatts
    ///
    /// If divisor is 100, raw is in units of 100mW (deciwatts), so we multiply by 100.
    #[inline]
    pub const fn raw_to_power_mw(&self, raw: u16) -> u32 {
        (raw as u32) * self.power_divisor
    }

    /// Convert milliwatts to raw power register value
    #[inline]
    pub const fn power_mw_to_raw(&self, power_mw: u32) -> u16 {
        (power_mw / self.power_divisor) as u16
    }
}

impl ProductModel {
    /// Get scaling factors for this product model.
    ///
    /// Voltage and current are centi-units on the whole family. Power is
    /// deci-watts on the high-current units (DPS3012, DPS5015, DPS5020,
    /// DPH3205) and centi-watts on the 5A units (DPS3005, DPS5005).
    pub const fn scaling_factors(&self) -> ScalingFactors {
        match self {
            ProductModel::Dps3005 | ProductModel::Dps5005 => ScalingFactors {
                voltage_divisor: 10,
                current_divisor: 10,
                power_divisor: 10,
            },
            ProductModel::Dps3012
            | ProductModel::Dps5015
            | ProductModel::Dps5020
            | ProductModel::Dph3205 => ScalingFactors {
                voltage_divisor: 10,
                current_divisor: 10,
                power_divisor: 100,
            },
        }
    }
}
