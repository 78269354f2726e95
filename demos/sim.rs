//! Drives the simulated power supply instead of real hardware.
//!
//! Run with: `cargo run --example sim --features sim`

use dps5015::{psu::Dps, sim::SimulatedDps};

const MODBUS_UNIT_ID: u8 = 0x01;

fn main() {
    // A simulated DPS5015 with a load drawing 2A at the setpoint voltage.
    let sim = SimulatedDps::new(MODBUS_UNIT_ID).with_load_ma(2_000);
    let mut psu: Dps<SimulatedDps, 128> = Dps::new(sim, MODBUS_UNIT_ID);

    psu.set_output_mv_ma(12_000, 3_000).unwrap();
    psu.set_output_state(true).unwrap();
    println!("CV, load within limit: {:#?}", psu.read_status().unwrap());

    // Drop the current limit below the load demand: the unit goes CC.
    psu.set_current_limit_ma(1_000).unwrap();
    println!("CC, limit engaged: {:#?}", psu.read_status().unwrap());

    psu.set_output_state(false).unwrap();
    println!("Output off: {:#?}", psu.read_status().unwrap());
}
