//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Probe inputs (ADC1, 12 dB attenuation)
// ---------------------------------------------------------------------------

/// ADC1 channel for each probe, in [`ProbeId`](crate::sensors::ProbeId)
/// order. Channels 3–6 are GPIO 4–7 on the ESP32-S3.
pub const PROBE_ADC_CHANNELS: [u32; crate::sensors::PROBE_COUNT] = [3, 4, 5, 6];

// ---------------------------------------------------------------------------
// Blower fan (logic-level MOSFET, low side)
// ---------------------------------------------------------------------------

pub const FAN_PWM_GPIO: i32 = 1;
/// 25 kHz keeps the blower inaudible.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;

// ---------------------------------------------------------------------------
// Damper servo
// ---------------------------------------------------------------------------

pub const SERVO_PWM_GPIO: i32 = 2;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// One servo frame in microseconds.
pub const SERVO_FRAME_US: u16 = 20_000;

// ---------------------------------------------------------------------------
// Output refresh
// ---------------------------------------------------------------------------

/// Interval of the output refresh task; one servo frame.
pub const OUTPUT_REFRESH_MS: u64 = 20;
