//! Lid-open detection and auto-resume.
//!
//! Once the pit has reached its setpoint, a sudden drop of more than
//! `offset_percent` below it (with the blower not already working hard)
//! is taken as the lid being opened. Control is suspended for the first
//! [`LIDOPEN_MIN_AUTORESUME`] seconds of the countdown. After that, the
//! countdown keeps running until it expires or the pit recovers to the
//! setpoint, whichever comes first.

use heapless::Vec;
use log::info;

use super::pid::PidController;
use crate::config::LIDOPEN_MIN_AUTORESUME;

/// Output average at or above which a temperature drop is not treated as
/// a lid event (the fire is simply struggling).
const MAX_OUTPUT_AVG_FOR_LID: i32 = 90;

/// State change observed during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidTransition {
    /// Pit reached the setpoint for the first time since it was set.
    SetpointReached,
    /// Pit recovered while an auto-resume countdown was running.
    Resumed,
    /// A lid-open event started a countdown of this many seconds.
    Opened(u16),
}

pub type LidTransitions = Vec<LidTransition, 2>;

pub struct LidOpenDetector {
    duration: u16,
    countdown: u16,
    offset_percent: u8,
}

impl LidOpenDetector {
    pub fn new(duration_secs: u16, offset_percent: u8) -> Self {
        Self {
            duration: duration_secs.max(LIDOPEN_MIN_AUTORESUME),
            countdown: 0,
            offset_percent,
        }
    }

    /// Run once per control period, after PID evaluation.
    pub fn evaluate(
        &mut self,
        pit: Option<f32>,
        pid: &mut PidController,
        period_secs: u16,
    ) -> LidTransitions {
        let mut out = LidTransitions::new();
        let pit = pit.map(|t| t as i32);
        let setpoint = i32::from(pid.setpoint());

        if let Some(temp) = pit.filter(|t| *t >= setpoint && !self.is_lid_open()) {
            if !pid.temperature_reached() {
                pid.mark_temperature_reached();
                info!("lid: setpoint {} reached at {}", setpoint, temp);
                let _ = out.push(LidTransition::SetpointReached);
            }
            if self.countdown != 0 {
                info!("lid: pit recovered, resuming with {}s left", self.countdown);
                let _ = out.push(LidTransition::Resumed);
            }
            self.countdown = 0;
        } else if self.countdown != 0 {
            self.countdown = self.countdown.saturating_sub(period_secs);
            if self.countdown == 0 {
                info!("lid: auto-resume countdown expired");
            }
        } else if let Some(temp) = pit {
            if pid.temperature_reached()
                && setpoint > 0
                && (setpoint - temp) * 100 / setpoint >= i32::from(self.offset_percent)
                && (pid.output_average() as i32) < MAX_OUTPUT_AVG_FOR_LID
            {
                self.countdown = self.duration;
                pid.clear_temperature_reached();
                info!(
                    "lid: opened (pit {} vs setpoint {}), resuming in {}s",
                    temp, setpoint, self.duration
                );
                let _ = out.push(LidTransition::Opened(self.duration));
            }
        }
        out
    }

    /// Control is suspended only during the first part of a countdown.
    pub fn is_lid_open(&self) -> bool {
        self.countdown != 0
            && self.duration.saturating_sub(self.countdown) <= LIDOPEN_MIN_AUTORESUME
    }

    pub fn countdown(&self) -> u16 {
        self.countdown
    }

    pub fn reset_countdown(&mut self) {
        self.countdown = 0;
    }

    pub fn duration(&self) -> u16 {
        self.duration
    }

    /// Clamped to [`LIDOPEN_MIN_AUTORESUME`].
    pub fn set_duration(&mut self, secs: u16) {
        self.duration = secs.max(LIDOPEN_MIN_AUTORESUME);
    }

    pub fn offset_percent(&self) -> u8 {
        self.offset_percent
    }

    pub fn set_offset(&mut self, percent: u8) {
        self.offset_percent = percent;
    }
}
