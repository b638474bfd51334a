//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control rules for the cooker: probe sampling
//! cadence, PID evaluation, lid-open handling and output commit. All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
