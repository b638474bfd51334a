//! Fuzz target: probe sampling and conversion pipeline
//!
//! Interprets the input as a stream of little-endian `u16` ADC samples and
//! drives `Probe::read_oversampled` / `add_raw_value` / `finalize` across
//! every probe kind and unit, verifying:
//! - No panics under any sample stream
//! - A finalized reading is either `None` or finite
//! - The window is always empty after `finalize`
//!
//! cargo fuzz run fuzz_probe_samples

#![no_main]

use libfuzzer_sys::fuzz_target;
use pitmaster::config::{ProbeKind, Units};
use pitmaster::sensors::Sampling;
use pitmaster::sensors::probe::{Probe, ProbeContext};

const KINDS: [ProbeKind; 3] = [ProbeKind::Internal, ProbeKind::Thermistor, ProbeKind::Thermocouple];
const UNITS: [Units; 4] = [Units::Raw, Units::Resistance, Units::Celsius, Units::Fahrenheit];

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // Header: geometry, kind/units selector, offset
    let adc_bits = 8 + data[0] % 5;
    let oversample_bits = (data[0] >> 4) % 4;
    let sampling = Sampling {
        adc_bits,
        oversample_bits,
        smoothing: 0.05,
    };
    let kind = KINDS[usize::from(data[1] % 3)];
    let units = UNITS[usize::from((data[1] >> 2) % 4)];
    let offset = data[2] as i8;

    let mut probe = Probe::new();
    probe.set_kind(kind);
    probe.set_offset(offset);
    if kind == ProbeKind::Thermocouple {
        probe.set_calibration([0.0, 0.0, 0.0, 500.0]);
    }
    probe.alarm_mut().set_low(100);
    probe.alarm_mut().set_high(200);

    let ctx = ProbeContext {
        units,
        is_pit: data[1] & 0x80 != 0,
        lid_open: data[1] & 0x40 != 0,
    };

    let mut samples = data[3..]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]) & sampling.sample_max());

    let mut reads = 0;
    loop {
        let mut exhausted = false;
        probe.read_oversampled(
            || match samples.next() {
                Some(s) => s,
                None => {
                    exhausted = true;
                    0
                }
            },
            sampling,
        );
        reads += 1;
        if exhausted {
            break;
        }
        if reads % 8 == 0 {
            probe.finalize(&ctx, sampling);
            assert_eq!(probe.accumulated_count(), 0);
            if let Some(t) = probe.temperature() {
                assert!(t.is_finite(), "non-finite reading {}", t);
            }
        }
    }

    probe.finalize(&ctx, sampling);
    assert_eq!(probe.accumulated_count(), 0);
    if let Some(t) = probe.temperature() {
        assert!(t.is_finite(), "non-finite reading {}", t);
    }
});
