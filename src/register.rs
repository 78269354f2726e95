//! This module is used to define the registers on the DPS PSUs.

use strum_macros::EnumIter;

/// Modbus holding registers of the DPS front panel.
///
/// All values are unsigned 16-bit. Addresses `0x0006`/`0x0007` are a
/// reserved gap on this family and carry nothing useful.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum DpsRegister {
    /// __R/W__ - Voltage setting.
    ///
    /// Value is u16 in centi-volts. E.g. 5.0V => `500`.
    VSet = 0x00,
    /// __R/W__ - Current limit setting.
    ///
    /// Value is u16 in centi-amps. E.g. 1.5A => `150`.
    ISet = 0x01,
    /// __R__ - Output voltage display value, in centi-volts.
    VOut = 0x02,
    /// __R__ - Output current display value, in centi-amps.
    IOut = 0x03,
    /// __R__ - Output power display value.
    ///
    /// Unit is model-dependent: deci-watts on the 12A/15A/20A units,
    /// centi-watts on the 5A units. See [`ScalingFactors`](crate::scaling::ScalingFactors).
    Power = 0x04,
    /// __R__ - Supply input voltage display value, in centi-volts.
    UIn = 0x05,
    /// __R__ - Constant voltage constant current state.
    /// * `0` - CV.
    /// * `1` - CC.
    ///
    /// See [`OutputMode`].
    CvCc = 0x08,
    /// __R/W__ - Switched output.
    /// * `0` - Off.
    /// * `1` - On.
    OnOff = 0x09,
}

impl From<DpsRegister> for u16 {
    fn from(value: DpsRegister) -> Self {
        value as u16
    }
}

/// This enum represents the supported product models.
///
/// The 5A and 12A/15A/20A units differ only in output envelope and in the
/// unit of the `Power` register.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
pub enum ProductModel {
    /// 30V / 5A buck unit.
    Dps3005,
    /// 50V / 5A buck unit.
    Dps5005,
    /// 30V / 12A buck unit.
    Dps3012,
    /// 50V / 15A buck unit.
    Dps5015,
    /// 50V / 20A buck unit.
    Dps5020,
    /// 32V / 5A buck-boost unit.
    Dph3205,
}

/// Represents the two possible power supply regulation modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

impl From<OutputMode> for u16 {
    fn from(value: OutputMode) -> Self {
        match value {
            OutputMode::Cv => 0x00,
            OutputMode::Cc => 0x01,
        }
    }
}

impl From<u16> for OutputMode {
    fn from(value: u16) -> Self {
        match value {
            0x00 => OutputMode::Cv,
            // The register is documented as 0/1 only.
            _ => OutputMode::Cc,
        }
    }
}

/// Used to be less ambiguous about whether something is on or off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    Off,
    /// Enabled.
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}
