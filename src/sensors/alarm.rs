//! Per-probe high/low alarm with arm/ring hysteresis.
//!
//! A side must first be *armed* by the temperature sitting on the safe side
//! of its threshold by at least one degree before it can *ring*. This keeps
//! an alarm from chattering when the reading hovers at the threshold and
//! from firing while a cooker is still heating through a low threshold.
//!
//! | Side | Arms when            | Rings when (armed) |
//! |------|----------------------|--------------------|
//! | Low  | `value >= low + 1`   | `value < low`      |
//! | High | `value < high - 1`   | `value >= high`    |

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSide {
    Low = 0,
    High = 1,
}

impl AlarmSide {
    pub const BOTH: [AlarmSide; 2] = [Self::Low, Self::High];

    const fn idx(self) -> usize {
        self as usize
    }
}

/// Arm/ring state machine for one probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeAlarm {
    /// `<= 0` means the side is disabled.
    thresholds: [i16; 2],
    armed: [bool; 2],
    ringing: [bool; 2],
}

impl ProbeAlarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a new temperature. Ringing is suppressed while the lid is
    /// open; arming is not.
    pub fn update_status(&mut self, value: f32, lid_open: bool) {
        if let Some(low) = self.threshold(AlarmSide::Low) {
            let low = f32::from(low);
            if value >= low + 1.0 {
                self.armed[AlarmSide::Low.idx()] = true;
            } else if value < low && self.armed[AlarmSide::Low.idx()] {
                self.ringing[AlarmSide::Low.idx()] = true;
            }
        }

        if let Some(high) = self.threshold(AlarmSide::High) {
            let high = f32::from(high);
            if value < high - 1.0 {
                self.armed[AlarmSide::High.idx()] = true;
            } else if value >= high && self.armed[AlarmSide::High.idx()] {
                self.ringing[AlarmSide::High.idx()] = true;
            }
        }

        if lid_open {
            self.ringing = [false; 2];
        }
    }

    pub fn set_low(&mut self, value: i16) {
        self.set_threshold(AlarmSide::Low, value);
    }

    pub fn set_high(&mut self, value: i16) {
        self.set_threshold(AlarmSide::High, value);
    }

    /// Replace a threshold and reset that side. Zero only silences the side;
    /// the stored threshold is kept.
    pub fn set_threshold(&mut self, side: AlarmSide, value: i16) {
        self.armed[side.idx()] = false;
        self.ringing[side.idx()] = false;
        if value == 0 {
            debug!("alarm: {:?} silenced", side);
            return;
        }
        self.thresholds[side.idx()] = value;
    }

    /// Enabled threshold for `side`, if any.
    pub fn threshold(&self, side: AlarmSide) -> Option<i16> {
        let t = self.thresholds[side.idx()];
        (t > 0).then_some(t)
    }

    /// Raw stored threshold, including disabled (negative or zero) values.
    pub fn stored_threshold(&self, side: AlarmSide) -> i16 {
        self.thresholds[side.idx()]
    }

    pub fn is_armed(&self, side: AlarmSide) -> bool {
        self.armed[side.idx()]
    }

    pub fn is_ringing(&self, side: AlarmSide) -> bool {
        self.ringing[side.idx()]
    }

    pub fn any_ringing(&self) -> bool {
        self.ringing.iter().any(|r| *r)
    }

    /// Clear every flag on both sides.
    pub fn silence_all(&mut self) {
        self.armed = [false; 2];
        self.ringing = [false; 2];
    }
}
