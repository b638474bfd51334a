//! Controller configuration parameters
//!
//! All tunable parameters for the pit controller: setpoint, display units,
//! PID gains, per-probe calibration and alarms, fan/servo output shaping,
//! lid-open detection and the sampling cadence.
//! Values are loaded through [`ConfigPort`](crate::app::ports::ConfigPort)
//! and may be replaced at runtime via [`AppCommand`](crate::app::commands::AppCommand).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::PROBE_COUNT;

/// Maximum probe name length (bytes).
pub const PROBE_NAME_LEN: usize = 13;

/// Minimum lid-open resume duration (seconds).
///
/// Also the window after a lid-open event during which control stays
/// suspended regardless of pit temperature.
pub const LIDOPEN_MIN_AUTORESUME: u16 = 30;

/// Display / conversion units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    /// Oversampled ADC counts, no conversion.
    Raw,
    /// Thermistor resistance (ohms) for food probes; pit stays Celsius.
    Resistance,
    Celsius,
    Fahrenheit,
}

impl Units {
    /// Single-letter code used by the serial/config front-ends.
    pub const fn code(self) -> char {
        match self {
            Self::Raw => 'A',
            Self::Resistance => 'R',
            Self::Celsius => 'C',
            Self::Fahrenheit => 'F',
        }
    }
}

impl TryFrom<char> for Units {
    type Error = ConfigError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'A' => Ok(Self::Raw),
            'R' => Ok(Self::Resistance),
            'C' => Ok(Self::Celsius),
            'F' => Ok(Self::Fahrenheit),
            _ => Err(ConfigError::ValidationFailed("units must be one of A, R, C, F")),
        }
    }
}

/// How a probe's signal is acquired and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    /// Thermistor on the local ADC (Steinhart-Hart conversion).
    Internal,
    /// Thermistor whose raw readings are delivered from outside the
    /// sampling loop (e.g. a wireless probe node).
    Thermistor,
    /// Amplified thermocouple or other linear mV/degree source on the local ADC.
    Thermocouple,
}

impl ProbeKind {
    /// Whether the orchestrator samples this probe from the local ADC.
    pub const fn is_analog(self) -> bool {
        matches!(self, Self::Internal | Self::Thermocouple)
    }
}

/// Per-probe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub name: String<PROBE_NAME_LEN>,
    pub kind: ProbeKind,
    /// Steinhart-Hart A, B, C and the divider resistance (ohms), or
    /// `[_, _, _, mV/degree scale]` for thermocouples.
    pub calibration: [f32; 4],
    /// Added to the converted temperature (display units).
    pub offset: i8,
    /// Low alarm threshold; `<= 0` disables.
    pub alarm_low: i16,
    /// High alarm threshold; `<= 0` disables.
    pub alarm_high: i16,
}

/// Maverick ET-732 probe with a 10 kOhm divider resistor.
pub const DEFAULT_CALIBRATION: [f32; 4] = [2.306_743_4e-4, 2.369_659_6e-4, 1.263_641_4e-7, 1.0e4];

impl ProbeConfig {
    fn named(name: &str) -> Self {
        let mut label = String::new();
        // Names longer than PROBE_NAME_LEN are truncated at a char boundary.
        for c in name.chars() {
            if label.push(c).is_err() {
                break;
            }
        }
        Self {
            name: label,
            kind: ProbeKind::Internal,
            calibration: DEFAULT_CALIBRATION,
            offset: 0,
            alarm_low: 0,
            alarm_high: 0,
        }
    }
}

/// PID gains, applied to the control error in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Constant output (percent).
    pub bias: f32,
    /// Percent per degree of error.
    pub proportional: f32,
    /// Percent per degree of accumulated error per period.
    pub integral: f32,
    /// Percent per degree of instantaneous-minus-average temperature.
    pub derivative: f32,
}

/// Blower fan output shaping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanConfig {
    /// Lowest reliable continuous speed (percent); below it long-pulse PWM is used.
    pub min_speed: u8,
    /// Speed at 100% controller output (percent).
    pub max_speed: u8,
    /// Duty byte written for the lowest non-zero speed.
    pub pwm_min: u8,
    /// Duty byte written at 100% speed.
    pub pwm_max: u8,
    pub invert: bool,
    /// Run the fan only when the controller asks for 100%.
    pub only_at_max: bool,
    /// Kick the fan at full duty for one sub-period when starting from stop.
    pub boost: bool,
}

/// Damper servo output shaping. Positions are in 10 µs units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    pub enabled: bool,
    pub min_position: u8,
    pub max_position: u8,
    pub invert: bool,
    /// Fully open the damper for any non-zero controller output.
    pub any_output_max: bool,
}

/// Lid-open detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidOpenConfig {
    /// Auto-resume countdown (seconds); clamped to [`LIDOPEN_MIN_AUTORESUME`].
    pub duration_secs: u16,
    /// Percentage drop below setpoint that counts as a lid-open event.
    pub offset_percent: u8,
}

/// Sampling and control cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Full control period (milliseconds, whole seconds).
    pub control_period_ms: u32,
    /// Sampling sub-periods per control period.
    pub sub_periods: u8,
    /// Long-pulse PWM window (milliseconds).
    pub long_pwm_period_ms: u32,
    /// Native ADC resolution (bits).
    pub adc_bits: u8,
    /// Oversampling: `4^oversample_bits` samples per sub-period.
    pub oversample_bits: u8,
    /// Probe temperature EMA factor.
    pub temperature_smoothing: f32,
    /// Controller output EMA factor.
    pub output_smoothing: f32,
    /// Status snapshot interval (control periods).
    pub status_interval_periods: u16,
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Pit setpoint in display units.
    pub setpoint: i16,
    pub units: Units,
    pub pid: PidGains,
    pub probes: [ProbeConfig; PROBE_COUNT],
    pub fan: FanConfig,
    pub servo: ServoConfig,
    pub lid_open: LidOpenConfig,
    pub timing: TimingConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            setpoint: 225,
            units: Units::Fahrenheit,

            pid: PidGains {
                bias: 0.0,
                proportional: 4.0,
                integral: 0.02,
                derivative: 5.0,
            },

            probes: [
                ProbeConfig::named("Pit"),
                ProbeConfig::named("Food Probe1"),
                ProbeConfig::named("Food Probe2"),
                ProbeConfig::named("Ambient"),
            ],

            fan: FanConfig {
                min_speed: 10,
                max_speed: 100,
                pwm_min: 0,
                pwm_max: 255,
                invert: false,
                only_at_max: false,
                boost: true,
            },

            servo: ServoConfig {
                enabled: false,
                min_position: 100, // 1.0 ms
                max_position: 200, // 2.0 ms
                invert: false,
                any_output_max: false,
            },

            lid_open: LidOpenConfig {
                duration_secs: 240,
                offset_percent: 6,
            },

            timing: TimingConfig {
                control_period_ms: 1000,
                sub_periods: 8,
                long_pwm_period_ms: 10_000,
                adc_bits: 12,
                oversample_bits: 2,
                temperature_smoothing: 1.0 / 20.0,
                output_smoothing: 1.0 / 120.0,
                status_interval_periods: 5,
            },
        }
    }
}

impl ControllerConfig {
    /// Range-check every field.
    ///
    /// The control core itself never validates; callers must run this
    /// before handing a configuration to the service or persisting it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.control_period_ms < 1000 || t.control_period_ms % 1000 != 0 {
            return Err(ConfigError::ValidationFailed(
                "control_period_ms must be a whole number of seconds",
            ));
        }
        if t.sub_periods == 0 {
            return Err(ConfigError::ValidationFailed("sub_periods must be >= 1"));
        }
        if t.long_pwm_period_ms < t.control_period_ms {
            return Err(ConfigError::ValidationFailed(
                "long_pwm_period_ms must be >= control_period_ms",
            ));
        }
        if !(8..=12).contains(&t.adc_bits) {
            return Err(ConfigError::ValidationFailed("adc_bits must be 8–12"));
        }
        if t.oversample_bits > 3 {
            return Err(ConfigError::ValidationFailed("oversample_bits must be 0–3"));
        }
        for alpha in [t.temperature_smoothing, t.output_smoothing] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ConfigError::ValidationFailed(
                    "smoothing factors must be in (0, 1]",
                ));
            }
        }

        if self.fan.max_speed > 100 || self.fan.min_speed > self.fan.max_speed {
            return Err(ConfigError::ValidationFailed(
                "fan speeds must satisfy min <= max <= 100",
            ));
        }
        if self.fan.pwm_min > self.fan.pwm_max {
            return Err(ConfigError::ValidationFailed("fan pwm_min must be <= pwm_max"));
        }
        if self.servo.min_position > self.servo.max_position {
            return Err(ConfigError::ValidationFailed(
                "servo min_position must be <= max_position",
            ));
        }
        if self.lid_open.offset_percent > 100 {
            return Err(ConfigError::ValidationFailed("lid offset_percent must be 0–100"));
        }

        let gains = [
            self.pid.bias,
            self.pid.proportional,
            self.pid.integral,
            self.pid.derivative,
        ];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::ValidationFailed("PID gains must be finite"));
        }

        for probe in &self.probes {
            if probe.calibration.iter().any(|c| !c.is_finite()) {
                return Err(ConfigError::ValidationFailed(
                    "probe calibration coefficients must be finite",
                ));
            }
            if probe.calibration[3] <= 0.0 {
                return Err(ConfigError::ValidationFailed(
                    "probe resistance/scale coefficient must be > 0",
                ));
            }
        }
        Ok(())
    }

    /// Lid-open duration after clamping to the minimum auto-resume time.
    pub fn lid_open_duration(&self) -> u16 {
        self.lid_open.duration_secs.max(LIDOPEN_MIN_AUTORESUME)
    }

    /// Interval between work units (milliseconds).
    pub fn sub_period_ms(&self) -> u32 {
        self.timing.control_period_ms / u32::from(self.timing.sub_periods.max(1))
    }
}
