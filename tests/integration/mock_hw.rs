//! Mock adapters for integration tests.
//!
//! `MockHardware` serves fixed raw ADC values per probe and records every
//! actuator call so tests can assert on the full command history.
//! `MockClock` only moves when told to.

use std::cell::Cell;

use pitmaster::app::events::AppEvent;
use pitmaster::app::ports::{ActuatorPort, Clock, ConfigError, ConfigPort, EventSink, SensorPort};
use pitmaster::app::service::AppService;
use pitmaster::config::ControllerConfig;
use pitmaster::sensors::conversion::{steinhart_hart_celsius, thermistor_resistance};
use pitmaster::sensors::{PROBE_COUNT, ProbeId};

/// Per-sample ADC resolution used by the default configuration.
pub const ADC_MAX: u16 = 4095;
/// Oversampled full scale for 12-bit samples with 2 extra bits.
pub const FULL_SCALE: u32 = 16_383;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Fan(u8),
    Servo(u16),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub adc: [u16; PROBE_COUNT],
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    /// All probes open (railed at 0).
    pub fn new() -> Self {
        Self {
            adc: [0; PROBE_COUNT],
            calls: Vec::new(),
        }
    }

    pub fn set_raw(&mut self, probe: ProbeId, raw: u16) {
        self.adc[probe.index()] = raw;
    }

    /// Raw sample a linear thermocouple with `scale` °C full scale reports
    /// at `celsius`.
    pub fn set_thermocouple_celsius(&mut self, probe: ProbeId, celsius: f32, scale: f32) {
        let oversampled = celsius / scale * FULL_SCALE as f32;
        let raw = (oversampled / 4.0).round().clamp(1.0, f32::from(ADC_MAX - 1));
        self.set_raw(probe, raw as u16);
    }

    /// Raw sample a default-calibrated thermistor reports at `celsius`.
    pub fn set_thermistor_celsius(&mut self, probe: ProbeId, celsius: f32) {
        self.set_raw(probe, thermistor_raw_for(celsius));
    }

    pub fn fan_writes(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Fan(d) => Some(*d),
                ActuatorCall::Servo(_) => None,
            })
            .collect()
    }

    pub fn servo_writes(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Servo(p) => Some(*p),
                ActuatorCall::Fan(_) => None,
            })
            .collect()
    }

    pub fn last_fan(&self) -> Option<u8> {
        self.fan_writes().last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self, probe: ProbeId) -> u16 {
        self.adc[probe.index()]
    }
}

impl ActuatorPort for MockHardware {
    fn set_fan_duty(&mut self, duty: u8) {
        self.calls.push(ActuatorCall::Fan(duty));
    }

    fn set_servo_pulse_width(&mut self, micros: u16) {
        self.calls.push(ActuatorCall::Servo(micros));
    }
}

/// Closest 12-bit sample for a default-calibrated thermistor at `celsius`.
pub fn thermistor_raw_for(celsius: f32) -> u16 {
    let cal = pitmaster::config::DEFAULT_CALIBRATION;
    (1..ADC_MAX)
        .min_by(|a, b| {
            let ta = steinhart_hart_celsius(thermistor_resistance(u32::from(*a) * 4, FULL_SCALE, cal[3]), &cal);
            let tb = steinhart_hart_celsius(thermistor_resistance(u32::from(*b) * 4, FULL_SCALE, cal[3]), &cal);
            (ta - celsius).abs().total_cmp(&(tb - celsius).abs())
        })
        .unwrap_or(1)
}

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

// ── Recording event sink ──────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── In-memory config store ────────────────────────────────────

pub struct MockStore {
    pub saved: Vec<ControllerConfig>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self { saved: Vec::new() }
    }
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        self.saved.last().cloned().ok_or(ConfigError::NotFound)
    }

    fn save(&mut self, config: &ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.saved.push(config.clone());
        Ok(())
    }
}

// ── Test rig ──────────────────────────────────────────────────

/// Sub-period of the default configuration.
pub const SUB_PERIOD_MS: u32 = 125;

pub struct Rig {
    pub app: AppService,
    pub clock: MockClock,
    pub hw: MockHardware,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: ControllerConfig) -> Self {
        let mut app = AppService::new(config);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            clock: MockClock::new(),
            hw: MockHardware::new(),
            sink,
        }
    }

    /// Advance one sub-period and run a work unit. Returns `true` when a
    /// full period completed.
    pub fn step(&mut self) -> bool {
        self.clock.advance(SUB_PERIOD_MS);
        self.app.do_work(&self.clock, &mut self.hw, &mut self.sink)
    }

    /// Run work units until a full control period completes.
    pub fn run_period(&mut self) {
        for _ in 0..=u8::MAX {
            if self.step() {
                return;
            }
        }
        panic!("no period completed");
    }

    pub fn run_periods(&mut self, n: usize) {
        for _ in 0..n {
            self.run_period();
        }
    }
}

// ── Pit plant ─────────────────────────────────────────────────

/// First-order pit model: each second the pit moves 1% of the way toward
/// `ambient + heat_per_duty · duty`.
pub struct PitPlant {
    pub celsius: f32,
    pub ambient: f32,
    pub heat_per_duty: f32,
}

#[allow(dead_code)]
impl PitPlant {
    pub fn new(ambient: f32) -> Self {
        Self {
            celsius: ambient,
            ambient,
            heat_per_duty: 300.0 / 255.0,
        }
    }

    pub fn step(&mut self, fan_duty: u8) {
        let target = self.ambient + self.heat_per_duty * f32::from(fan_duty);
        self.celsius += (target - self.celsius) * 0.01;
    }
}

pub fn fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}
