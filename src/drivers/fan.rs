//! Blower fan PWM channel.
//!
//! Applies the latched fan duty (0–255) to any
//! [`SetDutyCycle`] output. On ESP-IDF this is an LEDC channel; host
//! tests use a recording mock. The hardware is only written when the
//! latched value changes.

use embedded_hal::pwm::SetDutyCycle;

use super::output_latch::OutputLatch;
use crate::error::{ActuatorError, Result};

pub struct FanChannel<P> {
    pwm: P,
    applied: Option<u8>,
}

impl<P: SetDutyCycle> FanChannel<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, applied: None }
    }

    /// Apply the latched duty if it changed since the last refresh.
    pub fn refresh(&mut self, latch: &OutputLatch) -> Result<()> {
        let duty = latch.fan_duty();
        if self.applied == Some(duty) {
            return Ok(());
        }
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX))
            .map_err(|_| ActuatorError::FanPwmWriteFailed)?;
        self.applied = Some(duty);
        Ok(())
    }

    /// Duty currently on the pin, if any has been applied.
    pub fn applied(&self) -> Option<u8> {
        self.applied
    }
}
