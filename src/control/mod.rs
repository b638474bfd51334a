//! Control layer: PID loop, lid-open detection and output shaping.
//!
//! Everything here is pure logic over owned state. Hardware writes go
//! through [`ActuatorPort`](crate::app::ports::ActuatorPort).

pub mod lid;
pub mod output;
pub mod pid;
