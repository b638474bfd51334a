//! PID controller for pit temperature.
//!
//! Output is a percentage (0–100) recomputed once per control period from
//! the pit probe's temperature and its smoothed average:
//!
//! - **B**ias: constant offset
//! - **P**roportional: `Kp · error`
//! - **I**ntegral: accumulated `Ki · error`, frozen while the output is
//!   pinned against the limit the error is pushing toward
//! - **D**erivative: `Kd · (average − temperature)`, i.e. on the measured
//!   value rather than the error, so setpoint changes cause no kick
//!
//! A manual override pins the output until the next setpoint change.

use log::info;

use crate::config::PidGains;

/// One of the four PID terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidTerm {
    Bias = 0,
    Proportional = 1,
    Integral = 2,
    Derivative = 3,
}

impl PidTerm {
    pub const ALL: [PidTerm; 4] = [
        Self::Bias,
        Self::Proportional,
        Self::Integral,
        Self::Derivative,
    ];
}

/// Output ceiling (percent).
pub const OUTPUT_MAX: u8 = 100;

/// PID controller
pub struct PidController {
    setpoint: i16,
    gains: [f32; 4],
    terms: [f32; 4],
    output: u8,
    output_average: f32,
    output_smoothing: f32,
    manual: bool,
    temperature_reached: bool,
}

impl PidController {
    pub fn new(setpoint: i16, gains: PidGains, output_smoothing: f32) -> Self {
        let mut pid = Self {
            setpoint,
            gains: [0.0; 4],
            terms: [0.0; 4],
            output: 0,
            output_average: 0.0,
            output_smoothing,
            manual: false,
            temperature_reached: false,
        };
        pid.set_gains(gains);
        pid
    }

    /// Recompute the output for one control period.
    ///
    /// An invalid pit reading or an open lid forces the output to 0 and
    /// leaves every term untouched.
    pub fn evaluate(&mut self, pit: Option<f32>, pit_average: Option<f32>, lid_open: bool) {
        let previous = self.output;
        self.output = 0;

        let Some(temp) = pit else {
            return;
        };
        if lid_open {
            return;
        }

        let error = f32::from(self.setpoint) - temp;

        self.terms[PidTerm::Bias as usize] = self.gains[PidTerm::Bias as usize];
        self.terms[PidTerm::Proportional as usize] =
            self.gains[PidTerm::Proportional as usize] * error;

        // Anti-windup: only integrate toward the limit we aren't pinned at
        if (error > 0.0 && previous < OUTPUT_MAX) || (error < 0.0 && previous > 0) {
            self.terms[PidTerm::Integral as usize] += self.gains[PidTerm::Integral as usize] * error;
        }

        let average = pit_average.unwrap_or(temp);
        self.terms[PidTerm::Derivative as usize] =
            self.gains[PidTerm::Derivative as usize] * (average - temp);

        let sum: f32 = self.terms.iter().sum();
        // Truncate toward zero before clamping
        let control = sum as i32;
        self.output = control.clamp(0, i32::from(OUTPUT_MAX)) as u8;
    }

    /// Fold the current output into the smoothed output average.
    pub fn update_output_average(&mut self) {
        self.output_average += self.output_smoothing * (f32::from(self.output) - self.output_average);
    }

    /// Manual override: pin the output at `value` percent.
    pub fn set_output(&mut self, value: i32) {
        self.manual = true;
        self.output = value.clamp(0, i32::from(OUTPUT_MAX)) as u8;
        info!("pid: manual output {}%", self.output);
    }

    /// Change the setpoint and return to automatic control.
    pub fn set_setpoint(&mut self, value: i16) {
        self.setpoint = value;
        self.manual = false;
        self.temperature_reached = false;
        self.terms[PidTerm::Integral as usize] = 0.0;
        info!("pid: setpoint {}", value);
    }

    /// Replace one gain. Changing the integral gain discards the
    /// accumulated integral term.
    pub fn set_gain(&mut self, term: PidTerm, value: f32) {
        if term == PidTerm::Integral {
            self.terms[PidTerm::Integral as usize] = 0.0;
        }
        self.gains[term as usize] = value;
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.set_gain(PidTerm::Bias, gains.bias);
        self.set_gain(PidTerm::Proportional, gains.proportional);
        if self.gains[PidTerm::Integral as usize] != gains.integral {
            self.set_gain(PidTerm::Integral, gains.integral);
        }
        self.set_gain(PidTerm::Derivative, gains.derivative);
    }

    pub fn set_output_smoothing(&mut self, alpha: f32) {
        self.output_smoothing = alpha;
    }

    /// Pit first reached the setpoint: scale back the integral so the
    /// accumulated heat-up error does not carry into the hold.
    pub fn mark_temperature_reached(&mut self) {
        self.temperature_reached = true;
        self.terms[PidTerm::Integral as usize] *= 0.25;
    }

    pub fn clear_temperature_reached(&mut self) {
        self.temperature_reached = false;
    }

    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn output_average(&self) -> f32 {
        self.output_average
    }

    pub fn setpoint(&self) -> i16 {
        self.setpoint
    }

    pub fn gain(&self, term: PidTerm) -> f32 {
        self.gains[term as usize]
    }

    pub fn term(&self, term: PidTerm) -> f32 {
        self.terms[term as usize]
    }

    /// Current B, P, I, D term values.
    pub fn terms(&self) -> [f32; 4] {
        self.terms
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn temperature_reached(&self) -> bool {
        self.temperature_reached
    }
}
