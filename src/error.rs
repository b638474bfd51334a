//! Unified error types for the controller firmware.
//!
//! The control core itself is infallible: bad sensor data travels in-band
//! as an invalid temperature. What can fail is the edge of the system
//! (PWM writes and configuration storage), and those failures funnel
//! into [`Error`]. Peripheral bring-up reports its own
//! [`HwInitError`](crate::drivers::hw_init::HwInitError). All variants are `Copy`.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation outside the control core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Fan PWM duty-cycle write failed.
    FanPwmWriteFailed,
    /// Servo PWM duty-cycle write failed.
    ServoPwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FanPwmWriteFailed => write!(f, "fan PWM write failed"),
            Self::ServoPwmWriteFailed => write!(f, "servo PWM write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience alias used throughout the drivers.
pub type Result<T> = core::result::Result<T, Error>;
