//! Demonstration sensor drivers.
//!
//! A real deployment replaces these with drivers that talk to actual
//! hardware. Both kinds registered here accept every operation
//! immediately and report completion after a short simulated delay, to
//! exercise the manager's full power/firmware/rate state machine
//! end-to-end.

mod in_process;
mod out_of_process;

pub use in_process::VirtualSensor;
pub use out_of_process::spawn_out_of_process_driver;
