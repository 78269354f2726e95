use std::env;

use dps5015::psu::Dps;
use inquire::Select;
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
// The PSU can take a while to respond, a reasonably large time out is required.
const SERIAL_TIMEOUT_MS: u64 = 300;
const MODBUS_UNIT_ID: u8 = 0x01;
const OUTPUT_VOLTAGE_MV: u32 = 5_000; // 5V
const CURRENT_LIMIT_MA: u32 = 100; // 0.1A
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Open serial port
    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let port = PortWrapper(port);

    // Create a PSU object
    let mut psu: Dps<PortWrapper, 128> = Dps::new(port, MODBUS_UNIT_ID);

    // Show what the unit is doing before we touch it
    let status = psu.read_status().unwrap();
    println!("Initial status: {:#?}", status);
    println!(
        "Input voltage: {:.2}V",
        status.input_voltage_mv as f32 / 1000.0
    );

    // Set voltage setpoint and current limit in one transaction
    psu.set_output_mv_ma(OUTPUT_VOLTAGE_MV, CURRENT_LIMIT_MA)
        .unwrap();
    println!(
        "Set output to {}V / {}A",
        OUTPUT_VOLTAGE_MV as f32 / 1000.0,
        CURRENT_LIMIT_MA as f32 / 1000.0
    );

    // Enable the output
    psu.set_output_state(true).unwrap();
    println!("Output enabled");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    // Measure and display the output
    let measured_voltage = psu.read_output_voltage_mv().unwrap();
    let measured_current = psu.read_output_current_ma().unwrap();
    let measured_power = psu.read_power_mw().unwrap();
    println!(
        "Measured: {:.3}V {:.3}A {:.3}W ({:?})",
        measured_voltage as f32 / 1000.0,
        measured_current as f32 / 1000.0,
        measured_power as f32 / 1000.0,
        psu.read_output_mode().unwrap(),
    );

    // Leave the bench safe
    psu.set_output_state(false).unwrap();
    println!("Output disabled");
}
