//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log, display, radio link).

use crate::sensors::alarm::AlarmSide;
use crate::sensors::{PROBE_COUNT, ProbeId};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started with this setpoint.
    Started { setpoint: i16 },

    /// Periodic status snapshot.
    Status(StatusSnapshot),

    /// PID term breakdown, emitted with each status while the pit is valid.
    Pid(PidStatus),

    /// A probe alarm started ringing.
    AlarmRinging { probe: ProbeId, side: AlarmSide },

    /// The pit reached the setpoint for the first time.
    SetpointReached { setpoint: i16 },

    /// A lid-open event suspended control.
    LidOpened { countdown: u16 },

    /// The pit recovered before the auto-resume countdown ran out.
    LidResumed,

    /// Configuration was persisted.
    ConfigSaved,
}

/// A point-in-time controller status suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub setpoint: i16,
    /// Temperature of every probe in channel order; `None` when invalid.
    pub temperatures: [Option<f32>; PROBE_COUNT],
    /// Controller output (percent).
    pub output: u8,
    pub output_average: f32,
    /// Remaining lid-open countdown (seconds).
    pub lid_countdown: u16,
    pub fan_duty: u8,
    pub servo_pulse_us: u16,
    pub manual: bool,
}

/// PID internals for tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidStatus {
    pub bias: f32,
    pub proportional: f32,
    pub integral: f32,
    pub derivative: f32,
    /// Pit temperature minus its smoothed average.
    pub temperature_delta: f32,
}
