//! Lock-free hand-off between the control loop and the output refresh task.
//!
//! The control side stores the latest commanded values with `Release`;
//! the refresh side picks them up with `Acquire` at its next frame
//! boundary. Each actuator is a single atomic word, so a reader never
//! sees a torn value.

use core::sync::atomic::{AtomicU8, AtomicU16, Ordering};

pub struct OutputLatch {
    fan_duty: AtomicU8,
    servo_pulse_us: AtomicU16,
}

impl Default for OutputLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputLatch {
    /// Both outputs start off (duty 0, no servo pulse).
    pub const fn new() -> Self {
        Self {
            fan_duty: AtomicU8::new(0),
            servo_pulse_us: AtomicU16::new(0),
        }
    }

    pub fn set_fan_duty(&self, duty: u8) {
        self.fan_duty.store(duty, Ordering::Release);
    }

    pub fn fan_duty(&self) -> u8 {
        self.fan_duty.load(Ordering::Acquire)
    }

    pub fn set_servo_pulse_us(&self, micros: u16) {
        self.servo_pulse_us.store(micros, Ordering::Release);
    }

    /// 0 means no pulse has been commanded yet.
    pub fn servo_pulse_us(&self) -> u16 {
        self.servo_pulse_us.load(Ordering::Acquire)
    }
}
