//! Output path: controller output → modulator → adapter → PWM channel.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use pitmaster::adapters::hardware::{HardwareAdapter, sim_set_probe_adc};
use pitmaster::app::commands::AppCommand;
use pitmaster::app::service::AppService;
use pitmaster::config::ControllerConfig;
use pitmaster::control::output::BOOST_DUTY;
use pitmaster::drivers::fan::FanChannel;
use pitmaster::drivers::output_latch::OutputLatch;
use pitmaster::drivers::servo::ServoChannel;
use pitmaster::sensors::ProbeId;

use crate::mock_hw::*;

fn manual_rig(output: i32, edit: impl FnOnce(&mut ControllerConfig)) -> Rig {
    let mut cfg = ControllerConfig::default();
    edit(&mut cfg);
    let mut rig = Rig::new(cfg);
    rig.app
        .handle_command(AppCommand::SetManualOutput(output))
        .unwrap();
    rig
}

#[test]
fn direct_drive_above_min_speed() {
    let mut rig = manual_rig(40, |c| {
        c.fan.boost = false;
        c.fan.min_speed = 25;
    });
    rig.run_periods(2);
    assert_eq!(rig.hw.fan_writes(), [102, 102]);
    assert_eq!(rig.app.output().fan_speed(), 40);
}

#[test]
fn long_pulse_below_min_speed() {
    let mut rig = manual_rig(10, |c| {
        c.fan.boost = false;
        c.fan.min_speed = 25;
    });
    rig.run_periods(20);
    let on: [u8; 10] = [63, 63, 63, 63, 0, 0, 0, 0, 0, 0];
    assert_eq!(rig.hw.fan_writes(), [on, on].concat());
}

#[test]
fn boost_lasts_one_work_unit() {
    let mut rig = manual_rig(40, |_| {});
    rig.run_period();
    assert_eq!(rig.hw.fan_writes(), [BOOST_DUTY]);

    assert!(!rig.step());
    assert_eq!(rig.hw.fan_writes(), [BOOST_DUTY, 102]);

    rig.run_period();
    assert_eq!(rig.hw.fan_writes(), [BOOST_DUTY, 102, 102]);

    // Stopping and restarting boosts again
    rig.app
        .handle_command(AppCommand::SetManualOutput(0))
        .unwrap();
    rig.run_period();
    rig.app
        .handle_command(AppCommand::SetManualOutput(40))
        .unwrap();
    rig.run_period();
    assert_eq!(rig.hw.last_fan(), Some(BOOST_DUTY));
}

#[test]
fn servo_follows_output() {
    let mut rig = manual_rig(50, |c| c.servo.enabled = true);
    rig.run_period();
    assert_eq!(rig.hw.servo_writes(), [1500]);
    assert_eq!(rig.app.build_status().servo_pulse_us, 1500);

    rig.app
        .handle_command(AppCommand::SetManualOutput(100))
        .unwrap();
    rig.run_period();
    assert_eq!(rig.hw.servo_writes(), [1500, 2000]);
}

// ── Adapter → latch → PWM ─────────────────────────────────────

struct RecordingPwm {
    writes: Vec<u16>,
}

impl ErrorType for RecordingPwm {
    type Error = Infallible;
}

impl SetDutyCycle for RecordingPwm {
    fn max_duty_cycle(&self) -> u16 {
        1000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.writes.push(duty);
        Ok(())
    }
}

static LATCH: OutputLatch = OutputLatch::new();

#[test]
fn hardware_adapter_feeds_pwm_channels() {
    let mut cfg = ControllerConfig::default();
    cfg.fan.boost = false;
    cfg.servo.enabled = true;
    let mut app = AppService::new(cfg);
    let mut hw = HardwareAdapter::new(&LATCH);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    sim_set_probe_adc(ProbeId::Pit, thermistor_raw_for(90.0));
    app.start(&mut sink);
    clock.advance(SUB_PERIOD_MS);
    assert!(app.do_work(&clock, &mut hw, &mut sink));

    // 90 °C is ~194 °F, well under 225
    let output = app.pid().output();
    assert!(output > 0);
    assert_eq!(LATCH.fan_duty(), app.output().fan_duty());

    let mut fan = FanChannel::new(RecordingPwm { writes: Vec::new() });
    let mut servo = ServoChannel::new(RecordingPwm { writes: Vec::new() });
    fan.refresh(&LATCH).unwrap();
    servo.refresh(&LATCH).unwrap();
    assert_eq!(fan.applied(), Some(app.output().fan_duty()));
    assert_eq!(servo.applied(), Some(app.output().servo_pulse_us()));
}
