//! Probe subsystem: per-channel temperature estimation and the
//! aggregating [`ProbeBank`].
//!
//! The bank owns every [`Probe`] and is driven by the service in two
//! steps: [`ProbeBank::sample_analog`] once per sub-period and
//! [`ProbeBank::finalize_all`] once per full control period.

pub mod alarm;
pub mod conversion;
pub mod probe;

use crate::app::ports::SensorPort;
use crate::config::{ProbeConfig, ProbeKind, TimingConfig, Units};
use probe::{Probe, ProbeContext};

/// Number of probe channels on the board.
pub const PROBE_COUNT: usize = 4;

/// Probe channel identifiers. `Pit` is the controlled probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeId {
    Pit = 0,
    Food1 = 1,
    Food2 = 2,
    Ambient = 3,
}

impl ProbeId {
    pub const ALL: [ProbeId; PROBE_COUNT] = [Self::Pit, Self::Food1, Self::Food2, Self::Ambient];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_pit(self) -> bool {
        matches!(self, Self::Pit)
    }
}

impl TryFrom<usize> for ProbeId {
    type Error = usize;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(index).copied().ok_or(index)
    }
}

/// ADC geometry and smoothing shared by every probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub adc_bits: u8,
    pub oversample_bits: u8,
    /// EMA factor for the smoothed probe temperature.
    pub smoothing: f32,
}

impl Sampling {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            adc_bits: timing.adc_bits,
            oversample_bits: timing.oversample_bits,
            smoothing: timing.temperature_smoothing,
        }
    }

    /// Raw samples summed per sub-period (`4^oversample_bits`).
    pub const fn samples_per_read(self) -> u32 {
        1 << (2 * self.oversample_bits as u32)
    }

    /// Largest value a single raw sample can take; reaching it means the
    /// input is railed.
    pub const fn sample_max(self) -> u16 {
        ((1u32 << self.adc_bits) - 1) as u16
    }

    /// Full scale of an oversampled value.
    pub const fn full_scale(self) -> u32 {
        (1 << (self.adc_bits as u32 + self.oversample_bits as u32)) - 1
    }

    /// Maximum distance from the running mean before a window is rejected
    /// (6.25% of the oversampled range).
    pub const fn outlier_window(self) -> u32 {
        (self.full_scale() + 1) / 16
    }
}

/// Owns every probe channel.
pub struct ProbeBank {
    probes: [Probe; PROBE_COUNT],
    sampling: Sampling,
}

impl ProbeBank {
    pub fn new(sampling: Sampling) -> Self {
        Self {
            probes: core::array::from_fn(|_| Probe::new()),
            sampling,
        }
    }

    /// Apply per-probe kind, calibration, offset and alarm thresholds.
    pub fn configure(&mut self, configs: &[ProbeConfig; PROBE_COUNT], sampling: Sampling) {
        self.sampling = sampling;
        for (probe, cfg) in self.probes.iter_mut().zip(configs) {
            probe.configure(cfg);
        }
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn probe(&self, id: ProbeId) -> &Probe {
        &self.probes[id.index()]
    }

    pub fn probe_mut(&mut self, id: ProbeId) -> &mut Probe {
        &mut self.probes[id.index()]
    }

    pub fn pit(&self) -> &Probe {
        self.probe(ProbeId::Pit)
    }

    /// Take one oversampled reading from every probe on the local ADC.
    pub fn sample_analog(&mut self, sensor: &mut impl SensorPort) {
        let sampling = self.sampling;
        for id in ProbeId::ALL {
            let probe = &mut self.probes[id.index()];
            if probe.kind().is_analog() {
                probe.read_oversampled(|| sensor.read_raw(id), sampling);
            }
        }
    }

    /// Feed an externally acquired oversampled value into a probe's window.
    pub fn feed_raw(&mut self, id: ProbeId, value: u32) {
        let sampling = self.sampling;
        self.probes[id.index()].add_raw_value(value, sampling);
    }

    /// Close the averaging window on every probe and convert.
    pub fn finalize_all(&mut self, units: Units, lid_open: bool) {
        let sampling = self.sampling;
        for id in ProbeId::ALL {
            let ctx = ProbeContext {
                units,
                is_pit: id.is_pit(),
                lid_open,
            };
            self.probes[id.index()].finalize(&ctx, sampling);
        }
    }

    /// Current temperature of every probe, in channel order.
    pub fn temperatures(&self) -> [Option<f32>; PROBE_COUNT] {
        core::array::from_fn(|i| self.probes[i].temperature())
    }

    pub fn count_of_kind(&self, kind: ProbeKind) -> usize {
        self.probes.iter().filter(|p| p.kind() == kind).count()
    }

    /// True if any non-pit probe currently has a valid temperature.
    pub fn any_food_probe_active(&self) -> bool {
        self.probes[ProbeId::Food1.index()..]
            .iter()
            .any(Probe::has_temperature)
    }
}
