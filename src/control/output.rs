//! Controller output → blower duty and damper servo pulse.
//!
//! Small blowers stall below a minimum speed, so requests under
//! `min_speed` are emulated with long-pulse PWM: the fan runs at the
//! minimum speed for a proportional number of control periods out of a
//! `long_pwm_period_ms` window and is off for the rest.
//!
//! ```text
//! output 10%, min 25%, 10 slots:  ████░░░░░░  (4 on, 6 off)
//! ```

use log::debug;

use crate::app::ports::ActuatorPort;
use crate::config::{FanConfig, ServoConfig, TimingConfig};

/// Duty written while boost-starting a stopped fan.
pub const BOOST_DUTY: u8 = u8::MAX;

/// Microseconds per servo position unit.
const SERVO_POSITION_US: u16 = 10;

/// Map a percentage onto `[lo, hi]`.
fn map_percent(percent: u8, lo: u8, hi: u8) -> u16 {
    let span = u32::from(hi.saturating_sub(lo));
    (span * u32::from(percent) / 100 + u32::from(lo)) as u16
}

pub struct OutputModulator {
    fan: FanConfig,
    servo: ServoConfig,
    long_pwm_slots: u32,
    phase: u32,
    fan_speed: u8,
    fan_duty: u8,
    boost_active: bool,
    servo_pulse_us: u16,
}

impl OutputModulator {
    pub fn new(fan: FanConfig, servo: ServoConfig, timing: &TimingConfig) -> Self {
        let mut m = Self {
            fan,
            servo,
            long_pwm_slots: 1,
            phase: 0,
            fan_speed: 0,
            fan_duty: 0,
            boost_active: false,
            servo_pulse_us: 0,
        };
        m.configure(fan, servo, timing);
        m
    }

    pub fn configure(&mut self, fan: FanConfig, servo: ServoConfig, timing: &TimingConfig) {
        self.fan = fan;
        self.servo = servo;
        self.long_pwm_slots = (timing.long_pwm_period_ms / timing.control_period_ms.max(1)).max(1);
        if self.phase >= self.long_pwm_slots {
            self.phase = 0;
        }
    }

    /// Apply a new controller output to both actuators.
    pub fn commit(&mut self, output: u8, act: &mut impl ActuatorPort) {
        self.commit_fan(output, act);
        if self.servo.enabled {
            self.servo_pulse_us = self.servo_pulse_for(output);
            act.set_servo_pulse_width(self.servo_pulse_us);
        }
    }

    fn commit_fan(&mut self, output: u8, act: &mut impl ActuatorPort) {
        let speed = self.next_fan_speed(output);
        self.fan_speed = speed;
        let duty = self.duty_for_speed(speed);

        if self.fan.boost && self.fan_duty == 0 && duty != 0 {
            debug!("output: boost-starting fan (target duty {})", duty);
            self.fan_duty = duty;
            self.boost_active = true;
            act.set_fan_duty(BOOST_DUTY);
            return;
        }

        self.fan_duty = duty;
        act.set_fan_duty(duty);
    }

    /// End a boost started by the previous commit and write the real duty.
    pub fn end_boost(&mut self, act: &mut impl ActuatorPort) {
        if self.boost_active {
            self.boost_active = false;
            act.set_fan_duty(self.fan_duty);
        }
    }

    /// Fan speed (percent, before inversion) for this period. Advances the
    /// long-pulse phase when below the minimum speed.
    fn next_fan_speed(&mut self, output: u8) -> u8 {
        let mut speed = if self.fan.only_at_max && output < 100 {
            0
        } else {
            (u16::from(output) * u16::from(self.fan.max_speed) / 100) as u8
        };

        if speed < self.fan.min_speed {
            let on = self.long_pwm_slots * u32::from(speed) / u32::from(self.fan.min_speed)
                > self.phase;
            speed = if on { self.fan.min_speed } else { 0 };
            self.phase += 1;
            if self.phase >= self.long_pwm_slots {
                self.phase = 0;
            }
        } else {
            self.phase = 0;
        }

        if self.fan.invert {
            speed = self.fan.max_speed.saturating_sub(speed);
        }
        speed
    }

    /// Duty byte for a fan speed percentage.
    pub fn duty_for_speed(&self, speed: u8) -> u8 {
        if speed == 0 {
            0
        } else {
            map_percent(speed, self.fan.pwm_min, self.fan.pwm_max) as u8
        }
    }

    /// Servo pulse width (µs) for a controller output.
    pub fn servo_pulse_for(&self, output: u8) -> u16 {
        let mut percent = output.min(100);
        if self.servo.any_output_max && percent > 0 {
            percent = 100;
        }
        if self.servo.invert {
            percent = 100 - percent;
        }
        map_percent(percent, self.servo.min_position, self.servo.max_position) * SERVO_POSITION_US
    }

    /// Last fan speed (percent, after long-pulse and inversion).
    pub fn fan_speed(&self) -> u8 {
        self.fan_speed
    }

    /// Last duty committed, excluding any boost.
    pub fn fan_duty(&self) -> u8 {
        self.fan_duty
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_active
    }

    pub fn servo_pulse_us(&self) -> u16 {
        self.servo_pulse_us
    }

    pub fn long_pwm_phase(&self) -> u32 {
        self.phase
    }

    pub fn long_pwm_slots(&self) -> u32 {
        self.long_pwm_slots
    }
}
