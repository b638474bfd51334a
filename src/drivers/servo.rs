//! Damper servo PWM channel.
//!
//! The servo timer runs at one frame per [`SERVO_FRAME_US`]; the latched
//! pulse width becomes the high time within that frame. A new pulse takes
//! effect at the next frame boundary. Until a pulse has been commanded
//! the output stays low so the servo is not driven to an arbitrary end.

use embedded_hal::pwm::SetDutyCycle;

use super::output_latch::OutputLatch;
use crate::error::{ActuatorError, Result};
use crate::pins::SERVO_FRAME_US;

pub struct ServoChannel<P> {
    pwm: P,
    applied: Option<u16>,
}

impl<P: SetDutyCycle> ServoChannel<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, applied: None }
    }

    pub fn refresh(&mut self, latch: &OutputLatch) -> Result<()> {
        let pulse = latch.servo_pulse_us().min(SERVO_FRAME_US);
        if self.applied == Some(pulse) {
            return Ok(());
        }
        let result = if pulse == 0 {
            self.pwm.set_duty_cycle_fully_off()
        } else {
            self.pwm.set_duty_cycle_fraction(pulse, SERVO_FRAME_US)
        };
        result.map_err(|_| ActuatorError::ServoPwmWriteFailed)?;
        self.applied = Some(pulse);
        Ok(())
    }

    /// Pulse width (µs) currently on the pin.
    pub fn applied(&self) -> Option<u16> {
        self.applied
    }
}
