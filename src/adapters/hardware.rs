//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Reads probe ADC channels through [`SensorPort`] and latches fan/servo
//! commands through [`ActuatorPort`]. This is the only module on the
//! control side that touches hardware. On non-espidf targets the ADC is
//! replaced by per-probe atomics that tests and simulations can set.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::output_latch::OutputLatch;
use crate::sensors::ProbeId;
#[cfg(not(target_os = "espidf"))]
use crate::sensors::PROBE_COUNT;

#[cfg(target_os = "espidf")]
use crate::{drivers::hw_init, pins};

/// Simulated raw ADC value per probe (12-bit). Defaults to an open input.
#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_ADC: [AtomicU16; PROBE_COUNT] = [const { AtomicU16::new(0) }; PROBE_COUNT];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_adc(probe: ProbeId, raw: u16) {
    SIM_PROBE_ADC[probe.index()].store(raw, Ordering::Relaxed);
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    latch: &'static OutputLatch,
}

impl HardwareAdapter {
    pub fn new(latch: &'static OutputLatch) -> Self {
        Self { latch }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self, probe: ProbeId) -> u16 {
        hw_init::adc1_read(pins::PROBE_ADC_CHANNELS[probe.index()])
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self, probe: ProbeId) -> u16 {
        SIM_PROBE_ADC[probe.index()].load(Ordering::Relaxed)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_fan_duty(&mut self, duty: u8) {
        self.latch.set_fan_duty(duty);
    }

    fn set_servo_pulse_width(&mut self, micros: u16) {
        self.latch.set_servo_pulse_us(micros);
    }
}
