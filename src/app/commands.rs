//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial console,
//! front panel, radio link) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::{ControllerConfig, ProbeKind, Units};
use crate::control::pid::PidTerm;
use crate::sensors::ProbeId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// New pit setpoint; returns to automatic control.
    SetSetpoint(i16),

    /// Pin the controller output (percent) until the next setpoint change.
    SetManualOutput(i32),

    /// Replace one PID gain.
    SetPidGain(PidTerm, f32),

    /// Change display units by single-letter code (`A`, `R`, `C`, `F`).
    SetUnits(char),

    /// Change a probe's kind, discarding its readings.
    SetProbeKind(ProbeId, ProbeKind),

    /// Additive offset applied to a probe's converted temperature.
    SetProbeOffset(ProbeId, i8),

    /// Low/high alarm thresholds; 0 silences a side, negative disables it.
    SetAlarmThresholds { probe: ProbeId, low: i16, high: i16 },

    /// Lid-open drop percentage and auto-resume duration (seconds).
    SetLidOpen { offset_percent: u8, duration_secs: u16 },

    /// Hot-reload configuration (validated before it is applied).
    UpdateConfig(Box<ControllerConfig>),

    /// Explicitly persist the current config immediately.
    SaveConfig,
}

impl AppCommand {
    /// Convenience for [`AppCommand::SetUnits`] with a typed value.
    pub fn set_units(units: Units) -> Self {
        Self::SetUnits(units.code())
    }
}
