//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC on the ESP-IDF target). This is the only
//! place the status snapshot is rendered as text.

use core::fmt::Write;

use heapless::String;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `"225.4"` or `"U"` for an invalid probe.
fn fmt_temp(out: &mut String<64>, t: Option<f32>) {
    let _ = match t {
        Some(v) => write!(out, "{:.1}", v),
        None => write!(out, "U"),
    };
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                let mut temps: String<64> = String::new();
                for (i, t) in s.temperatures.iter().enumerate() {
                    if i > 0 {
                        let _ = temps.push(',');
                    }
                    fmt_temp(&mut temps, *t);
                }
                info!(
                    "STATUS | sp={} | probes={} | out={}% (avg {:.1}) | lid={}s | \
                     fan={} servo={}us{}",
                    s.setpoint,
                    temps,
                    s.output,
                    s.output_average,
                    s.lid_countdown,
                    s.fan_duty,
                    s.servo_pulse_us,
                    if s.manual { " | MANUAL" } else { "" },
                );
            }
            AppEvent::Pid(p) => {
                info!(
                    "PID    | b={:.1} p={:.1} i={:.1} d={:.1} | dT={:.2}",
                    p.bias, p.proportional, p.integral, p.derivative, p.temperature_delta,
                );
            }
            AppEvent::AlarmRinging { probe, side } => {
                warn!("ALARM  | {:?} {:?}", probe, side);
            }
            AppEvent::SetpointReached { setpoint } => {
                info!("PIT    | setpoint {} reached", setpoint);
            }
            AppEvent::LidOpened { countdown } => {
                info!("LID    | open, auto-resume in {}s", countdown);
            }
            AppEvent::LidResumed => {
                info!("LID    | closed, control resumed");
            }
            AppEvent::ConfigSaved => {
                info!("CONFIG | saved");
            }
            AppEvent::Started { setpoint } => {
                info!("START  | setpoint={}", setpoint);
            }
        }
    }
}
