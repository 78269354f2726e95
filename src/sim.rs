//! A software DPS5015 for development without a physical unit attached.
//!
//! [`SimulatedDps`] implements [`embedded_io::Read`] and [`embedded_io::Write`],
//! so it plugs into [`Dps`](crate::psu::Dps) in place of a serial port. Incoming
//! Modbus RTU frames are answered from an in-memory register bank, and readback
//! registers follow the setpoints through a crude ohmic load model:
//!
//! * output off: `VOut`, `IOut` and `Power` read zero,
//! * output on, load within the current limit: `VOut` = `VSet`, CV mode,
//! * output on, load demanding more than `ISet`: `IOut` clamps to `ISet`,
//!   the output voltage sags proportionally, CC mode.
//!
//! Writes to read-only registers are answered with a Modbus illegal-data-address
//! exception, as on the real unit.

use rmodbus::{
    consts::ModbusErrorCode,
    server::{context::ModbusContext, storage::ModbusStorage, ModbusFrame},
    ModbusProto,
};

use crate::register::DpsRegister;

/// Raw `UIn` value reported by the simulator: a 55.12V supply rail.
const INPUT_VOLTAGE_RAW: u16 = 5512;

/// The simulated power supply endpoint.
///
/// One `write()` call must carry one whole request frame, which is how
/// [`Dps`](crate::psu::Dps) emits them.
pub struct SimulatedDps {
    /// Holding register bank. Only 0x0000..=0x0009 are populated.
    context: ModbusStorage<0, 0, 0, 16>,
    /// Response bytes queued for the next `read()` calls.
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer.
    read_position: usize,
    unit_id: u8,
    /// Current the attached load would draw at the setpoint voltage, in mA.
    load_ma: u32,
}

/// Error type of the simulated serial endpoint.
#[derive(Debug)]
pub enum SimError {
    /// No response bytes pending.
    WouldBlock,
    /// Frame or response did not fit the internal buffers.
    BufferOverflow,
}

impl core::fmt::Display for SimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SimError::WouldBlock => write!(f, "no response bytes pending"),
            SimError::BufferOverflow => write!(f, "frame did not fit the internal buffers"),
        }
    }
}

impl core::error::Error for SimError {}

impl embedded_io::Error for SimError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            SimError::WouldBlock => embedded_io::ErrorKind::TimedOut,
            SimError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
        }
    }
}

impl embedded_io::ErrorType for SimulatedDps {
    type Error = SimError;
}

impl SimulatedDps {
    /// Create a simulated unit answering on the given Modbus unit ID.
    ///
    /// Starts like a freshly powered DPS5015: zero setpoints, output off,
    /// no load attached.
    pub fn new(unit_id: u8) -> Self {
        let mut sim = Self {
            context: ModbusStorage::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            unit_id,
            load_ma: 0,
        };
        sim.refresh();
        sim
    }

    /// Attach a load drawing the given current at the setpoint voltage.
    pub fn with_load_ma(mut self, load_ma: u32) -> Self {
        self.set_load_ma(load_ma);
        self
    }

    /// Change the attached load.
    pub fn set_load_ma(&mut self, load_ma: u32) {
        self.load_ma = load_ma;
        self.refresh();
    }

    /// Whether a write to `count` registers starting at `reg` stays within
    /// the writable part of the map (`VSet`, `ISet`, `OnOff`).
    fn write_allowed(reg: u16, count: u16) -> bool {
        let end = reg.saturating_add(count.saturating_sub(1));
        end <= u16::from(DpsRegister::ISet) || (reg == u16::from(DpsRegister::OnOff) && count == 1)
    }

    /// Recompute the readback registers from the setpoints and the load.
    fn refresh(&mut self) {
        let vset = self.context.get_holding(DpsRegister::VSet.into()).unwrap_or(0);
        let iset = self.context.get_holding(DpsRegister::ISet.into()).unwrap_or(0);
        let on = self.context.get_holding(DpsRegister::OnOff.into()).unwrap_or(0) != 0;

        let load_raw = (self.load_ma / 10) as u16;

        let (vout, iout, cc) = if !on {
            (0, 0, false)
        } else if load_raw <= iset || load_raw == 0 {
            (vset, load_raw, false)
        } else {
            // Current limit engaged: an ohmic load sags proportionally.
            let sagged = (u32::from(vset) * u32::from(iset) / u32::from(load_raw)) as u16;
            (sagged, iset, true)
        };
        // Power register in deci-watts, as on the 15A units.
        let power = (u32::from(vout) * u32::from(iout) / 1000) as u16;

        // The bank is larger than the register map, so these cannot fail.
        self.context.set_holding(DpsRegister::VOut.into(), vout).ok();
        self.context.set_holding(DpsRegister::IOut.into(), iout).ok();
        self.context.set_holding(DpsRegister::Power.into(), power).ok();
        self.context
            .set_holding(DpsRegister::UIn.into(), INPUT_VOLTAGE_RAW)
            .ok();
        self.context
            .set_holding(DpsRegister::CvCc.into(), cc as u16)
            .ok();
    }

    /// Parse one request frame, apply it to the register bank and queue the
    /// response for subsequent reads.
    fn process_frame(&mut self, frame_bytes: &[u8]) -> Result<(), SimError> {
        // Frames addressed to other units get no answer, like on a shared bus.
        if frame_bytes.first() != Some(&self.unit_id) {
            return Ok(());
        }

        let mut response: heapless::Vec<u8, 256> = heapless::Vec::new();
        let mut frame =
            ModbusFrame::new(self.unit_id, frame_bytes, ModbusProto::Rtu, &mut response);

        if frame.parse().is_err() {
            // Malformed frame: stay quiet and let the client time out.
            return Ok(());
        }

        if frame.processing_required {
            let result = if frame.readonly {
                frame.process_read(&self.context)
            } else if Self::write_allowed(frame.reg, frame.count) {
                frame.process_write(&mut self.context)
            } else {
                frame.error = Some(ModbusErrorCode::IllegalDataAddress);
                Ok(())
            };
            if result.is_err() {
                return Ok(());
            }
        }

        if frame.response_required {
            if frame.finalize_response().is_err() {
                return Ok(());
            }
            self.read_buffer
                .extend_from_slice(&response)
                .map_err(|_| SimError::BufferOverflow)?;
        }

        self.refresh();
        Ok(())
    }
}

impl embedded_io::Write for SimulatedDps {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        // Drop response bytes of earlier transactions the client never read.
        if self.read_position >= self.read_buffer.len() {
            self.read_buffer.clear();
            self.read_position = 0;
        }
        self.process_frame(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for SimulatedDps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.read_position >= self.read_buffer.len() {
            return Err(SimError::WouldBlock);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        psu::Dps,
        register::{OutputMode, State},
    };

    fn psu_on_sim(load_ma: u32) -> Dps<SimulatedDps, 128> {
        let sim = SimulatedDps::new(0x01).with_load_ma(load_ma);
        Dps::new(sim, 0x01)
    }

    #[test]
    fn powers_up_with_output_off() {
        let mut psu = psu_on_sim(0);

        assert_eq!(psu.get_output_state().unwrap(), State::Off);
        assert_eq!(psu.read_output_voltage_mv().unwrap(), 0);
        assert_eq!(psu.read_input_voltage_mv().unwrap(), 55_120);
    }

    #[test]
    fn setpoints_read_back() {
        let mut psu = psu_on_sim(0);

        psu.set_voltage_mv(12_500).unwrap();
        psu.set_current_limit_ma(1_500).unwrap();

        assert_eq!(psu.get_voltage_setpoint_mv().unwrap(), 12_500);
        assert_eq!(psu.get_current_limit_ma().unwrap(), 1_500);
        // Output still off: the readback stays at zero.
        assert_eq!(psu.read_output_voltage_mv().unwrap(), 0);
    }

    #[test]
    fn cv_operation_within_current_limit() {
        let mut psu = psu_on_sim(1_470);

        psu.set_output_mv_ma(12_500, 1_500).unwrap();
        psu.set_output_state(true).unwrap();

        let status = psu.read_status().unwrap();
        assert_eq!(status.voltage_setpoint_mv, 12_500);
        assert_eq!(status.current_limit_ma, 1_500);
        assert_eq!(status.output_voltage_mv, 12_500);
        assert_eq!(status.output_current_ma, 1_470);
        // 12.5V * 1.47A = 18.375W, truncated to the deci-watt register.
        assert_eq!(status.output_power_mw, 18_300);
        assert_eq!(status.mode, OutputMode::Cv);
        assert_eq!(status.output, State::On);
    }

    #[test]
    fn current_limit_engages_cc_mode() {
        // Load wants 5A, limit allows 1.5A.
        let mut psu = psu_on_sim(5_000);

        psu.set_output_mv_ma(12_500, 1_500).unwrap();
        psu.set_output_state(true).unwrap();

        assert_eq!(psu.read_output_mode().unwrap(), OutputMode::Cc);
        assert_eq!(psu.read_output_current_ma().unwrap(), 1_500);
        // Ohmic sag: 12.5V * 1.5/5.0 = 3.75V.
        assert_eq!(psu.read_output_voltage_mv().unwrap(), 3_750);
    }

    #[test]
    fn disabling_output_zeroes_readbacks() {
        let mut psu = psu_on_sim(1_000);

        psu.set_output_mv_ma(5_000, 2_000).unwrap();
        psu.set_output_state(true).unwrap();
        assert_eq!(psu.read_output_voltage_mv().unwrap(), 5_000);

        psu.set_output_state(false).unwrap();
        assert_eq!(psu.get_output_state().unwrap(), State::Off);
        assert_eq!(psu.read_output_voltage_mv().unwrap(), 0);
        assert_eq!(psu.read_power_mw().unwrap(), 0);
    }

    #[test]
    fn sim_error_satisfies_embedded_io_bounds() {
        fn assert_impl<E: core::error::Error + embedded_io::Error>(_: &E) {}
        assert_impl(&SimError::WouldBlock);
        assert_eq!(SimError::WouldBlock.to_string(), "no response bytes pending");
    }

    #[test]
    fn write_to_readonly_register_is_rejected() {
        let mut psu = psu_on_sim(0);

        // VOut is read-only; the unit answers with an exception frame,
        // which the client surfaces as an invalid response.
        let result = psu.write_modbus_single(crate::register::DpsRegister::VOut, 100_u16);
        assert!(matches!(result, Err(crate::error::Error::InvalidResponse)));
    }

    #[test]
    fn other_unit_ids_get_no_answer() {
        let sim = SimulatedDps::new(0x02);
        // Client talks to unit 1, the simulated device is unit 2.
        let mut psu: Dps<SimulatedDps, 128> = Dps::new(sim, 0x01);

        let result = psu.get_output_state();
        assert!(matches!(result, Err(crate::error::Error::Timeout)));
    }
}
