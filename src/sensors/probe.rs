//! Single probe channel: raw-sample validation, window averaging,
//! calibration and smoothing.
//!
//! ## Sampling window
//!
//! Every sub-period the probe takes `4^n` raw ADC samples and folds the
//! oversampled result into an accumulator. A railed sample (0 or ADC max)
//! or a value more than 6.25% of full scale away from the running mean
//! poisons the whole window: the accumulator is zeroed and stays zero until
//! the window is closed. Closing the window ([`Probe::finalize`]) once per
//! control period converts the mean to a temperature; a poisoned window
//! yields an invalid (`None`) temperature.
//!
//! The sample count always advances, so a rejected window costs one period
//! of data but never stalls the cadence.

use log::debug;

use super::Sampling;
use super::alarm::ProbeAlarm;
use super::conversion::{
    steinhart_hart_celsius, thermistor_resistance, thermocouple_celsius, to_display_units,
};
use crate::config::{DEFAULT_CALIBRATION, ProbeConfig, ProbeKind, Units};

/// Read-only controller state a probe needs when closing its window.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext {
    pub units: Units,
    /// The pit probe always reports degrees, even in resistance mode.
    pub is_pit: bool,
    pub lid_open: bool,
}

/// One temperature channel.
#[derive(Debug, Clone)]
pub struct Probe {
    kind: ProbeKind,
    calibration: [f32; 4],
    offset: i8,
    accumulator: u32,
    accumulated_count: u16,
    temperature: Option<f32>,
    average: Option<f32>,
    alarm: ProbeAlarm,
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe {
    pub fn new() -> Self {
        Self {
            kind: ProbeKind::Internal,
            calibration: DEFAULT_CALIBRATION,
            offset: 0,
            accumulator: 0,
            accumulated_count: 0,
            temperature: None,
            average: None,
            alarm: ProbeAlarm::new(),
        }
    }

    /// Load kind, calibration, offset and alarm thresholds.
    pub fn configure(&mut self, cfg: &ProbeConfig) {
        if cfg.kind != self.kind {
            self.set_kind(cfg.kind);
        }
        self.calibration = cfg.calibration;
        self.offset = cfg.offset;
        self.alarm.set_low(cfg.alarm_low);
        self.alarm.set_high(cfg.alarm_high);
    }

    /// Change the probe kind, discarding any partial window and readings.
    pub fn set_kind(&mut self, kind: ProbeKind) {
        self.kind = kind;
        self.accumulator = 0;
        self.accumulated_count = 0;
        self.temperature = None;
        self.average = None;
    }

    pub fn set_offset(&mut self, offset: i8) {
        self.offset = offset;
    }

    pub fn set_calibration(&mut self, calibration: [f32; 4]) {
        self.calibration = calibration;
    }

    /// Take `4^n` raw samples and fold the oversampled value in.
    ///
    /// Sampling stops at the first railed sample and the window is
    /// poisoned instead.
    pub fn read_oversampled(&mut self, mut read: impl FnMut() -> u16, sampling: Sampling) {
        let max = sampling.sample_max();
        let mut sum: u32 = 0;
        for _ in 0..sampling.samples_per_read() {
            let raw = read();
            if raw == 0 || raw >= max {
                debug!("probe: railed sample ({}) discards this read", raw);
                self.add_raw_value(0, sampling);
                return;
            }
            sum += u32::from(raw);
        }
        self.add_raw_value(sum >> sampling.oversample_bits, sampling);
    }

    /// Fold one oversampled value into the current window.
    pub fn add_raw_value(&mut self, value: u32, sampling: Sampling) {
        if value == 0 {
            self.accumulator = 0;
        } else if self.accumulated_count == 0 {
            self.accumulator = value;
        } else if value.abs_diff(self.accumulator / u32::from(self.accumulated_count))
            > sampling.outlier_window()
        {
            if self.accumulator != 0 {
                debug!("probe: outlier {} rejects the window", value);
            }
            self.accumulator = 0;
        } else if self.accumulator != 0 {
            self.accumulator += value;
        }
        self.accumulated_count = self.accumulated_count.saturating_add(1);
    }

    /// Close the window: convert the mean, smooth, and evaluate alarms.
    ///
    /// With an empty window the stored temperature is left as is.
    pub fn finalize(&mut self, ctx: &ProbeContext, sampling: Sampling) {
        if self.accumulated_count != 0 {
            let mean = self.accumulator / u32::from(self.accumulated_count);
            self.accumulator = 0;
            self.accumulated_count = 0;

            if ctx.units == Units::Raw {
                self.temperature = Some(mean as f32);
                return;
            }

            if mean == 0 {
                self.temperature = None;
            } else {
                let full_scale = sampling.full_scale();
                match self.kind {
                    ProbeKind::Thermocouple => {
                        let celsius = thermocouple_celsius(mean, full_scale, self.calibration[3]);
                        self.temperature = to_display_units(celsius, ctx.units, self.offset);
                    }
                    ProbeKind::Internal | ProbeKind::Thermistor => {
                        let ohms = thermistor_resistance(mean, full_scale, self.calibration[3]);
                        if ctx.units == Units::Resistance && !ctx.is_pit {
                            self.temperature = ohms.is_finite().then_some(ohms);
                            return;
                        }
                        let celsius = steinhart_hart_celsius(ohms, &self.calibration);
                        self.temperature = to_display_units(celsius, ctx.units, self.offset);
                    }
                }
            }
        }

        match self.temperature {
            Some(t) => {
                self.average = Some(match self.average {
                    None => t,
                    Some(avg) => avg + sampling.smoothing * (t - avg),
                });
                self.alarm.update_status(t, ctx.lid_open);
            }
            None => self.alarm.silence_all(),
        }
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn offset(&self) -> i8 {
        self.offset
    }

    pub fn calibration(&self) -> &[f32; 4] {
        &self.calibration
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Exponentially smoothed temperature.
    pub fn average(&self) -> Option<f32> {
        self.average
    }

    pub fn has_temperature(&self) -> bool {
        self.temperature.is_some()
    }

    pub fn accumulator(&self) -> u32 {
        self.accumulator
    }

    pub fn accumulated_count(&self) -> u16 {
        self.accumulated_count
    }

    pub fn alarm(&self) -> &ProbeAlarm {
        &self.alarm
    }

    pub fn alarm_mut(&mut self) -> &mut ProbeAlarm {
        &mut self.alarm
    }
}
