use crate::{
    error::Result,
    limits::DeviceLimits,
    register::{DpsRegister, OutputMode, ProductModel, State},
    scaling::ScalingFactors,
};
use embedded_io::Error;

/// You can create a Dps using any interface which implements [embedded_io::Read] & [embedded_io::Write].
///
/// For its methods, we use the nomenclature that "set" means to write a configuration and "get" means to read
/// back a configuration value. Whereas "read" means to get a measured value.
pub struct Dps<S: embedded_io::Read + embedded_io::Write, const L: usize = 128> {
    interface: S,
    /// Default for PSU is 0x01.
    unit_id: u8,
    /// Raw register value scaling of this model.
    scaling: ScalingFactors,
    /// Output envelope of this model, checked before setpoint writes.
    limits: DeviceLimits,
}

/// One snapshot of the whole register bank, taken with a single read burst.
///
/// See [`Dps::read_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Configured output voltage in millivolts.
    pub voltage_setpoint_mv: u32,
    /// Configured output current limit in milliamps.
    pub current_limit_ma: u32,
    /// Measured output voltage in millivolts.
    pub output_voltage_mv: u32,
    /// Measured output current in milliamps.
    pub output_current_ma: u32,
    /// Measured output power in milliwatts.
    pub output_power_mw: u32,
    /// Measured supply input voltage in millivolts.
    pub input_voltage_mv: u32,
    /// Active regulation mode.
    pub mode: OutputMode,
    /// Whether the output stage is switched on.
    pub output: State,
}

/// Number of registers covered by [`Dps::read_status`]. (0x0000..=0x0009.)
const STATUS_REGISTER_COUNT: u16 = 10;

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Dps<S, L> {
    /// Create a new Dps instance for a DPS5015, with the given interface and unit ID.
    pub fn new(interface: S, unit_id: u8) -> Self {
        Self::for_model(interface, unit_id, ProductModel::Dps5015)
    }

    /// Create a new Dps instance for a specific model.
    ///
    /// The model selects the power register scaling and the setpoint envelope.
    pub fn for_model(interface: S, unit_id: u8, model: ProductModel) -> Self {
        Self {
            interface,
            unit_id,
            scaling: model.scaling_factors(),
            limits: model.limits(),
        }
    }

    /// Override the scaling factors, e.g. for a model variant this crate does not know.
    pub fn set_scaling_factors(&mut self, scaling: ScalingFactors) {
        self.scaling = scaling;
    }

    /// Override the setpoint envelope.
    pub fn set_limits(&mut self, limits: DeviceLimits) {
        self.limits = limits;
    }

    /// Set the output target voltage. Value supplied in millivolts.
    pub fn set_voltage_mv(&mut self, voltage_mv: u32) -> Result<(), S::Error> {
        if !self.limits.voltage_in_range(voltage_mv) {
            return Err(crate::error::Error::OutOfRange);
        }
        let raw = self.scaling.voltage_mv_to_raw(voltage_mv);
        self.write_modbus_single(DpsRegister::VSet, raw)?;
        Ok(())
    }

    /// Get the configured output target voltage. Value returned in millivolts.
    pub fn get_voltage_setpoint_mv(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::VSet)?;
        Ok(self.scaling.raw_to_voltage_mv(raw))
    }

    /// Set the output current limit. Value supplied in milliamps.
    pub fn set_current_limit_ma(&mut self, current_ma: u32) -> Result<(), S::Error> {
        if !self.limits.current_in_range(current_ma) {
            return Err(crate::error::Error::OutOfRange);
        }
        let raw = self.scaling.current_ma_to_raw(current_ma);
        self.write_modbus_single(DpsRegister::ISet, raw)?;
        Ok(())
    }

    /// Get the configured output current limit. Value returned in milliamps.
    pub fn get_current_limit_ma(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::ISet)?;
        Ok(self.scaling.raw_to_current_ma(raw))
    }

    /// Set voltage setpoint and current limit together, in one bus transaction.
    ///
    /// `VSet` and `ISet` are adjacent, so both fit a single write-multiple
    /// request and take effect in the same control cycle.
    pub fn set_output_mv_ma(&mut self, voltage_mv: u32, current_ma: u32) -> Result<(), S::Error> {
        if !self.limits.voltage_in_range(voltage_mv) || !self.limits.current_in_range(current_ma) {
            return Err(crate::error::Error::OutOfRange);
        }
        let data = [
            self.scaling.voltage_mv_to_raw(voltage_mv),
            self.scaling.current_ma_to_raw(current_ma),
        ];
        self.write_modbus_bulk(DpsRegister::VSet, data)
    }

    /// Return the measured output voltage in millivolts.
    pub fn read_output_voltage_mv(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::VOut)?;
        Ok(self.scaling.raw_to_voltage_mv(raw))
    }

    /// Return the measured output current in milliamps.
    pub fn read_output_current_ma(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::IOut)?;
        Ok(self.scaling.raw_to_current_ma(raw))
    }

    /// Return the measured output power in milliwatts.
    ///
    /// The raw register unit differs between models; the conversion uses the
    /// scaling factors this client was constructed with.
    pub fn read_power_mw(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::Power)?;
        Ok(self.scaling.raw_to_power_mw(raw))
    }

    /// Return the measured supply input voltage in millivolts.
    pub fn read_input_voltage_mv(&mut self) -> Result<u32, S::Error> {
        let raw = self.read_modbus_single(DpsRegister::UIn)?;
        Ok(self.scaling.raw_to_voltage_mv(raw))
    }

    /// Get the currently active regulation mode. (CV or CC.)
    pub fn read_output_mode(&mut self) -> Result<OutputMode, S::Error> {
        let value = self.read_modbus_single(DpsRegister::CvCc)?;
        Ok(OutputMode::from(value))
    }

    /// Enable/disable the output.
    pub fn set_output_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.write_modbus_single(DpsRegister::OnOff, state.into() as u16)?;
        Ok(())
    }

    /// Read whether the output is enabled or disabled.
    pub fn get_output_state(&mut self) -> Result<State, S::Error> {
        let value = self.read_modbus_single(DpsRegister::OnOff)?;
        Ok(State::from(value != 0))
    }

    /// Read the whole register bank in one burst and decode it.
    ///
    /// One request/response pair instead of eight, so all fields of the
    /// returned [`Status`] come from the same instant.
    pub fn read_status(&mut self) -> Result<Status, S::Error> {
        let registers = self.read_modbus_bulk(DpsRegister::VSet, STATUS_REGISTER_COUNT)?;
        if registers.len() < STATUS_REGISTER_COUNT as usize {
            return Err(crate::error::Error::InvalidResponse);
        }
        // Indices 6 and 7 are the reserved gap.
        Ok(Status {
            voltage_setpoint_mv: self.scaling.raw_to_voltage_mv(registers[0]),
            current_limit_ma: self.scaling.raw_to_current_ma(registers[1]),
            output_voltage_mv: self.scaling.raw_to_voltage_mv(registers[2]),
            output_current_ma: self.scaling.raw_to_current_ma(registers[3]),
            output_power_mw: self.scaling.raw_to_power_mw(registers[4]),
            input_voltage_mv: self.scaling.raw_to_voltage_mv(registers[5]),
            mode: OutputMode::from(registers[8]),
            output: State::from(registers[9] != 0),
        })
    }

    /// Write to a single register of the PSU.
    pub fn write_modbus_single(
        &mut self,
        register: impl Into<u16>,
        data: impl Into<u16>,
    ) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut response: heapless::Vec<u8, L> = heapless::Vec::new();

        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holding(register.into(), data.into(), &mut request)?;

        self.interface
            .write_all(&request)
            .map_err(crate::error::Error::SerialError)?;

        // The device echoes the request frame verbatim: 8 bytes.
        self.read_response(&mut response, 8)?;

        if request.as_slice() != response.as_slice() {
            Err(crate::error::Error::InvalidResponse)
        } else {
            Ok(())
        }
    }

    /// Write to multiple, sequential PSU registers.
    pub fn write_modbus_bulk(
        &mut self,
        start_register: impl Into<u16>,
        data: impl AsRef<[u16]>,
    ) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut response: heapless::Vec<u8, L> = heapless::Vec::new();

        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holdings_bulk(start_register.into(), data.as_ref(), &mut request)?;

        self.interface
            .write_all(&request)
            .map_err(crate::error::Error::SerialError)?;

        // Response: unit + function + start address + quantity + CRC.
        self.read_response(&mut response, 8)?;

        // First 6 bytes of the request are echoed back on success. An
        // exception response is shorter and fails the length check.
        if response.len() < 6 || request.as_slice()[0..=5] != response.as_slice()[0..=5] {
            Err(crate::error::Error::InvalidResponse)
        } else {
            Ok(())
        }
    }

    /// Read a single register from the PSU.
    pub fn read_modbus_single(&mut self, register: impl Into<u16>) -> Result<u16, S::Error> {
        let registers = self.read_modbus_bulk(register, 1)?;
        registers
            .first()
            .copied()
            .ok_or(crate::error::Error::InvalidResponse)
    }

    /// Read multiple, sequential registers from the PSU.
    pub fn read_modbus_bulk(
        &mut self,
        start_register: impl Into<u16>,
        count: u16,
    ) -> Result<heapless::Vec<u16, 64>, S::Error> {
        let mut buff: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);

        req.generate_get_holdings(start_register.into(), count, &mut buff)?;

        self.interface
            .write_all(&buff)
            .map_err(crate::error::Error::SerialError)?;

        // Reuse same buffer when reading back.
        buff.clear();

        // Response: unit + function + byte count + registers + CRC.
        self.read_response(&mut buff, 5 + 2 * count as usize)?;

        // Parse the response using rmodbus. This also checks the CRC.
        let mut parsed_data: heapless::Vec<u16, 64> = heapless::Vec::new();
        req.parse_u16(&buff, &mut parsed_data)
            .map_err(|_| crate::error::Error::InvalidResponse)?;

        Ok(parsed_data)
    }

    /// Accumulate response bytes until `expected` have arrived, or the
    /// interface reports a timeout.
    ///
    /// A timeout with a partial frame in hand still goes to the parser; the
    /// CRC check decides whether the frame was complete after all.
    fn read_response(
        &mut self,
        buff: &mut heapless::Vec<u8, L>,
        expected: usize,
    ) -> Result<(), S::Error> {
        let mut temp_buf = [0u8; 8];
        loop {
            match self.interface.read(&mut temp_buf) {
                // Zero bytes means the interface hit end-of-stream.
                Ok(0) => {
                    return if buff.is_empty() {
                        Err(crate::error::Error::Timeout)
                    } else {
                        Ok(())
                    };
                }
                Ok(bytes_read) => {
                    if buff.extend_from_slice(&temp_buf[0..bytes_read]).is_err() {
                        return Err(crate::error::Error::BufferError);
                    }
                    if buff.len() >= expected {
                        return Ok(());
                    }
                }
                Err(e) => {
                    return match e.kind() {
                        embedded_io::ErrorKind::Other | embedded_io::ErrorKind::TimedOut => {
                            if buff.is_empty() {
                                // The device never answered.
                                Err(crate::error::Error::Timeout)
                            } else {
                                Ok(())
                            }
                        }
                        _ => Err(crate::error::Error::SerialError(e)),
                    };
                }
            }
        }
    }
}
