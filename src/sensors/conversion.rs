//! Calibration math: ADC counts → resistance → degrees.
//!
//! Thermistors sit on the ground side of a voltage divider whose fixed
//! resistor goes to Vcc, so `R = R_fixed / (full_scale / adc - 1)`.
//! Resistance is converted with the Steinhart-Hart equation
//! `1/T = A + B·ln R + C·(ln R)^3`.

use crate::config::Units;

const KELVIN_OFFSET: f32 = 273.15;

/// Anything at or below -20 °C (-4 °F) is treated as a disconnected probe.
const SANITY_MIN_C: f32 = -20.0;
/// Anything above 500 °C (932 °F) is treated as a shorted probe.
const SANITY_MAX_C: f32 = 500.0;

/// Thermocouple scales below this are mV/°C at a 3.3 V reference.
const MV_SCALE_THRESHOLD: f32 = 100.0;
const REFERENCE_MV: f32 = 3300.0;

/// Divider resistance of a thermistor reading `adc` counts out of `full_scale`.
pub fn thermistor_resistance(adc: u32, full_scale: u32, fixed_ohms: f32) -> f32 {
    fixed_ohms / ((full_scale as f32 / adc as f32) - 1.0)
}

/// Steinhart-Hart conversion of `ohms` to degrees Celsius.
pub fn steinhart_hart_celsius(ohms: f32, coefficients: &[f32; 4]) -> f32 {
    let [a, b, c, _] = *coefficients;
    let ln_r = ohms.ln();
    let kelvin = 1.0 / ((c * ln_r * ln_r + b) * ln_r + a);
    kelvin - KELVIN_OFFSET
}

/// Linear thermocouple amplifier conversion.
///
/// `scale` is the full-scale temperature; values below 100 are taken as
/// mV/°C at a 3.3 V reference and rescaled.
pub fn thermocouple_celsius(adc: u32, full_scale: u32, scale: f32) -> f32 {
    let scale = if scale < MV_SCALE_THRESHOLD {
        REFERENCE_MV / scale
    } else {
        scale
    };
    adc as f32 / full_scale as f32 * scale
}

/// Apply the sanity window, unit conversion and probe offset.
///
/// Returns `None` for non-finite or out-of-range readings.
pub fn to_display_units(celsius: f32, units: Units, offset: i8) -> Option<f32> {
    if !celsius.is_finite() || celsius <= SANITY_MIN_C || celsius > SANITY_MAX_C {
        return None;
    }
    let value = match units {
        Units::Fahrenheit => celsius_to_fahrenheit(celsius),
        _ => celsius,
    };
    Some(value + f32::from(offset))
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * (9.0 / 5.0) + 32.0
}
