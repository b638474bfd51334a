//! Actuator drivers, hardware initialisation, and the output hand-off.

pub mod fan;
pub mod hw_init;
pub mod output_latch;
pub mod servo;
pub mod watchdog;
