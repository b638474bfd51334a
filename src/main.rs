//! Pitmaster Firmware: Main Entry Point
//!
//! Hexagonal architecture with a cooperative control loop and a separate
//! output refresh task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsConfigStore  MonotonicClock│
//! │  (Sensor+Actuator) (EventSink)    (ConfigPort)    (Clock)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Probes · PID · Lid-open · Output modulation           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  OutputLatch ──▶ refresh task ──▶ FanChannel / ServoChannel    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use log::{info, warn};

use pitmaster::adapters::hardware::HardwareAdapter;
use pitmaster::adapters::log_sink::LogEventSink;
use pitmaster::adapters::nvs::NvsConfigStore;
use pitmaster::adapters::time::MonotonicClock;
use pitmaster::app::ports::{ConfigError, ConfigPort};
use pitmaster::app::service::AppService;
use pitmaster::config::ControllerConfig;
use pitmaster::drivers::fan::FanChannel;
use pitmaster::drivers::hw_init::{self, HwInitError};
use pitmaster::drivers::output_latch::OutputLatch;
use pitmaster::drivers::servo::ServoChannel;
use pitmaster::drivers::watchdog::Watchdog;
use pitmaster::pins;

/// Commands from the control loop to the output refresh task.
static OUTPUT_LATCH: OutputLatch = OutputLatch::new();

/// Main-loop poll interval; well under one sub-period.
const LOOP_POLL_MS: u64 = 10;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Pitmaster v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Probe ADC ──────────────────────────────────────────
    hw_init::init_peripherals()?;

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsConfigStore::new() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match nvs.as_ref().map(ConfigPort::load) {
        Some(Ok(cfg)) => {
            info!("Config loaded from NVS");
            cfg
        }
        Some(Err(ConfigError::NotFound)) | None => {
            info!("No stored config, using defaults");
            ControllerConfig::default()
        }
        Some(Err(e)) => {
            warn!("Config load failed ({}), using defaults", e);
            ControllerConfig::default()
        }
    };

    // ── 4. Output PWM + refresh task ──────────────────────────
    let peripherals = Peripherals::take()?;
    let fan_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(pins::FAN_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits8),
    )
    .map_err(|_| HwInitError::LedcInitFailed)?;
    let fan_pwm = LedcDriver::new(peripherals.ledc.channel0, fan_timer, peripherals.pins.gpio1)
        .map_err(|_| HwInitError::LedcInitFailed)?;

    let servo_timer = LedcTimerDriver::new(
        peripherals.ledc.timer1,
        &TimerConfig::default()
            .frequency(pins::SERVO_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits14),
    )
    .map_err(|_| HwInitError::LedcInitFailed)?;
    let servo_pwm = LedcDriver::new(peripherals.ledc.channel1, servo_timer, peripherals.pins.gpio2)
        .map_err(|_| HwInitError::LedcInitFailed)?;

    info!(
        "Outputs: fan GPIO{} @ {} Hz, servo GPIO{} @ {} Hz",
        pins::FAN_PWM_GPIO,
        pins::FAN_PWM_FREQ_HZ,
        pins::SERVO_PWM_GPIO,
        pins::SERVO_PWM_FREQ_HZ
    );

    thread::Builder::new()
        .name("outputs".into())
        .stack_size(4096)
        .spawn(move || {
            let mut fan = FanChannel::new(fan_pwm);
            let mut servo = ServoChannel::new(servo_pwm);
            loop {
                if let Err(e) = fan.refresh(&OUTPUT_LATCH) {
                    warn!("outputs: {}", e);
                }
                if let Err(e) = servo.refresh(&OUTPUT_LATCH) {
                    warn!("outputs: {}", e);
                }
                thread::sleep(Duration::from_millis(pins::OUTPUT_REFRESH_MS));
            }
        })?;

    // ── 5. Construct adapters and app service ─────────────────
    let clock = MonotonicClock::new();
    let mut hw = HardwareAdapter::new(&OUTPUT_LATCH);
    let mut log_sink = LogEventSink::new();
    let watchdog = Watchdog::subscribe();

    let mut app = AppService::new(config);
    app.start(&mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        app.do_work(&clock, &mut hw, &mut log_sink);

        // Config auto-save (5s debounce after last change).
        if let Some(store) = nvs.as_mut() {
            app.auto_save_if_needed(store, &mut log_sink);
        }

        watchdog.feed();
        thread::sleep(Duration::from_millis(LOOP_POLL_MS));
    }
}
