//! End-to-end control tests: AppService driven through mock ports.

use pitmaster::app::commands::AppCommand;
use pitmaster::app::events::AppEvent;
use pitmaster::config::{ControllerConfig, ProbeKind};
use pitmaster::sensors::ProbeId;
use pitmaster::sensors::alarm::AlarmSide;
use pitmaster::sensors::conversion::thermistor_resistance;

use crate::mock_hw::*;

/// Pit thermocouple full scale used by these tests (°C).
const TC_SCALE: f32 = 500.0;

fn thermocouple_pit_config() -> ControllerConfig {
    let mut cfg = ControllerConfig::default();
    cfg.probes[ProbeId::Pit.index()].kind = ProbeKind::Thermocouple;
    cfg.probes[ProbeId::Pit.index()].calibration[3] = TC_SCALE;
    cfg
}

fn rig_with_pit_at(fahrenheit_value: f32) -> Rig {
    let mut rig = Rig::new(thermocouple_pit_config());
    rig.hw
        .set_thermocouple_celsius(ProbeId::Pit, celsius(fahrenheit_value), TC_SCALE);
    rig
}

// ── Cadence ───────────────────────────────────────────────────

#[test]
fn work_units_are_throttled_to_sub_period() {
    let mut rig = Rig::new(ControllerConfig::default());
    assert!(!rig.app.do_work(&rig.clock, &mut rig.hw, &mut rig.sink));
    rig.clock.advance(124);
    assert!(!rig.app.do_work(&rig.clock, &mut rig.hw, &mut rig.sink));
    assert_eq!(rig.app.period_count(), 0);

    // First work unit closes a period immediately
    rig.clock.advance(1);
    assert!(rig.app.do_work(&rig.clock, &mut rig.hw, &mut rig.sink));
    assert_eq!(rig.app.period_count(), 1);

    // Then one period per eight work units
    let completed: Vec<bool> = (0..8).map(|_| rig.step()).collect();
    assert_eq!(completed, [false, false, false, false, false, false, false, true]);
    assert_eq!(rig.app.period_count(), 2);
}

#[test]
fn repeated_poll_without_time_passing_is_a_no_op() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.run_period();
    let calls = rig.hw.calls.len();
    for _ in 0..20 {
        assert!(!rig.app.do_work(&rig.clock, &mut rig.hw, &mut rig.sink));
    }
    assert_eq!(rig.hw.calls.len(), calls);
}

#[test]
fn clock_wraparound_keeps_cadence() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.clock = MockClock::starting_at(u32::MAX - 200);
    assert!(rig.app.do_work(&rig.clock, &mut rig.hw, &mut rig.sink));

    // The next eight work units straddle the wrap
    let completed = (0..8).filter(|_| rig.step()).count();
    assert_eq!(completed, 1);
    assert_eq!(rig.app.period_count(), 2);
}

// ── Control ───────────────────────────────────────────────────

#[test]
fn pit_below_setpoint_drives_output() {
    let mut rig = rig_with_pit_at(220.0);
    rig.run_period();

    let pit = rig.app.probes().pit().temperature().unwrap();
    assert!((pit - 220.0).abs() < 0.5, "pit read {}", pit);

    let output = rig.app.pid().output();
    assert!(output > 0 && output <= 100, "output {}", output);
    assert!(rig.app.pid_status().is_some());
    assert!(rig.hw.last_fan().is_some_and(|d| d > 0));
}

#[test]
fn pit_above_setpoint_idles_fan() {
    let mut rig = rig_with_pit_at(240.0);
    rig.run_periods(3);
    assert_eq!(rig.app.pid().output(), 0);
    assert!(rig.hw.fan_writes().iter().all(|d| *d == 0));
}

#[test]
fn disconnected_pit_forces_output_off() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.run_periods(3);
    assert_eq!(rig.app.probes().pit().temperature(), None);
    assert_eq!(rig.app.pid().output(), 0);
    assert!(rig.app.pid_status().is_none());
    assert!(rig.hw.fan_writes().iter().all(|d| *d == 0));
}

#[test]
fn closed_loop_settles_at_setpoint() {
    let mut rig = Rig::new(thermocouple_pit_config());
    let mut plant = PitPlant::new(20.0);
    let mut peak = f32::MIN;

    for _ in 0..900 {
        rig.hw
            .set_thermocouple_celsius(ProbeId::Pit, plant.celsius, TC_SCALE);
        rig.run_period();
        plant.step(rig.app.output().fan_duty());
        peak = peak.max(fahrenheit(plant.celsius));
    }

    let pit = rig.app.probes().pit().temperature().unwrap();
    assert!((pit - 225.0).abs() < 5.0, "pit settled at {}", pit);
    assert!(peak < 240.0, "overshoot to {}", peak);
    assert!(rig.app.pid().temperature_reached());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SetpointReached { setpoint: 225 })),
        1
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LidOpened { .. })), 0);
}

#[test]
fn manual_output_holds_until_setpoint_change() {
    let mut cfg = ControllerConfig::default();
    cfg.fan.boost = false;
    let mut rig = Rig::new(cfg);
    rig.app
        .handle_command(AppCommand::SetManualOutput(40))
        .unwrap();

    // No pit probe: a manual output still drives the fan
    rig.run_periods(3);
    assert!(rig.app.pid().is_manual());
    assert_eq!(rig.app.pid().output(), 40);
    assert_eq!(rig.hw.fan_writes(), [102, 102, 102]);

    rig.app.handle_command(AppCommand::SetSetpoint(250)).unwrap();
    rig.run_period();
    assert!(!rig.app.pid().is_manual());
    assert_eq!(rig.app.pid().output(), 0);
}

#[test]
fn manual_output_is_clamped() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app
        .handle_command(AppCommand::SetManualOutput(250))
        .unwrap();
    assert_eq!(rig.app.pid().output(), 100);
    rig.app
        .handle_command(AppCommand::SetManualOutput(-5))
        .unwrap();
    assert_eq!(rig.app.pid().output(), 0);
}

// ── Probes and units ──────────────────────────────────────────

#[test]
fn thermistor_food_probe_reads_temperature() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.hw.set_thermistor_celsius(ProbeId::Food1, 60.0);
    rig.run_period();
    let t = rig.app.probes().probe(ProbeId::Food1).temperature().unwrap();
    assert!((t - fahrenheit(60.0)).abs() < 1.0, "food probe read {}", t);
    assert_eq!(rig.app.probes().probe(ProbeId::Food2).temperature(), None);
}

#[test]
fn raw_units_report_oversampled_mean() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app.handle_command(AppCommand::SetUnits('A')).unwrap();
    rig.hw.set_raw(ProbeId::Pit, 1000);
    rig.run_period();
    assert_eq!(rig.app.probes().pit().temperature(), Some(4000.0));
}

#[test]
fn resistance_units_report_ohms_for_food_probes() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app.handle_command(AppCommand::SetUnits('R')).unwrap();
    rig.hw.set_raw(ProbeId::Food1, 2048);
    rig.hw.set_thermistor_celsius(ProbeId::Pit, 100.0);
    rig.run_period();

    let ohms = rig.app.probes().probe(ProbeId::Food1).temperature().unwrap();
    let expected = thermistor_resistance(4 * 2048, FULL_SCALE, 1.0e4);
    assert!((ohms - expected).abs() < 0.01);

    // The pit keeps controlling in degrees
    let pit = rig.app.probes().pit().temperature().unwrap();
    assert!((pit - 100.0).abs() < 1.0, "pit read {}", pit);
}

#[test]
fn external_thermistor_probe_uses_fed_values() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app
        .handle_command(AppCommand::SetProbeKind(ProbeId::Food2, ProbeKind::Thermistor))
        .unwrap();
    // The local ADC reading for this probe is ignored
    rig.hw.set_raw(ProbeId::Food2, 100);

    let raw = u32::from(thermistor_raw_for(70.0)) * 4;
    rig.run_period();
    rig.app.feed_raw(ProbeId::Food2, raw);
    rig.app.feed_raw(ProbeId::Food2, raw);
    rig.run_period();

    let t = rig.app.probes().probe(ProbeId::Food2).temperature().unwrap();
    assert!((t - fahrenheit(70.0)).abs() < 1.0, "external probe read {}", t);
}

#[test]
fn probe_offset_shifts_reading() {
    let mut rig = rig_with_pit_at(200.0);
    rig.app
        .handle_command(AppCommand::SetProbeOffset(ProbeId::Pit, -10))
        .unwrap();
    rig.run_period();
    let pit = rig.app.probes().pit().temperature().unwrap();
    assert!((pit - 190.0).abs() < 0.5, "pit read {}", pit);
}

// ── Alarms ────────────────────────────────────────────────────

#[test]
fn alarm_event_fires_once_per_ring() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app
        .handle_command(AppCommand::SetAlarmThresholds {
            probe: ProbeId::Food1,
            low: -1,
            high: 150,
        })
        .unwrap();

    // 140 °F arms the high side
    rig.hw.set_thermistor_celsius(ProbeId::Food1, 60.0);
    rig.run_periods(2);
    let alarm = rig.app.probes().probe(ProbeId::Food1).alarm();
    assert!(alarm.is_armed(AlarmSide::High));
    assert!(!alarm.is_ringing(AlarmSide::High));

    // 158 °F rings it
    rig.hw.set_thermistor_celsius(ProbeId::Food1, 70.0);
    rig.run_periods(4);
    let ringing = |e: &AppEvent| {
        matches!(
            e,
            AppEvent::AlarmRinging {
                probe: ProbeId::Food1,
                side: AlarmSide::High
            }
        )
    };
    assert_eq!(rig.sink.count(ringing), 1);

    // Re-setting the threshold silences and disarms
    rig.app
        .handle_command(AppCommand::SetAlarmThresholds {
            probe: ProbeId::Food1,
            low: -1,
            high: 150,
        })
        .unwrap();
    rig.run_period();
    assert!(!rig.app.probes().probe(ProbeId::Food1).alarm().any_ringing());
    assert_eq!(rig.sink.count(ringing), 1);
}

#[test]
fn unplugged_probe_silences_alarm() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.app
        .handle_command(AppCommand::SetAlarmThresholds {
            probe: ProbeId::Food1,
            low: 100,
            high: -1,
        })
        .unwrap();
    rig.hw.set_thermistor_celsius(ProbeId::Food1, 60.0);
    rig.run_period();
    rig.hw.set_thermistor_celsius(ProbeId::Food1, 30.0);
    rig.run_period();
    assert!(rig.app.probes().probe(ProbeId::Food1).alarm().is_ringing(AlarmSide::Low));

    rig.hw.set_raw(ProbeId::Food1, 0);
    rig.run_period();
    assert!(!rig.app.probes().probe(ProbeId::Food1).alarm().any_ringing());
}

// ── Status and persistence ────────────────────────────────────

#[test]
fn status_and_pid_reports_every_five_periods() {
    let mut rig = rig_with_pit_at(200.0);
    rig.run_periods(10);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Status(_))), 2);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Pid(_))), 2);

    let Some(AppEvent::Status(status)) = rig
        .sink
        .events
        .iter()
        .rev()
        .find(|e| matches!(e, AppEvent::Status(_)))
    else {
        panic!("no status event");
    };
    assert_eq!(status.setpoint, 225);
    assert!(status.temperatures[0].is_some());
    assert_eq!(status.temperatures[1], None);
    assert!(!status.manual);
}

#[test]
fn runtime_change_is_saved_after_debounce() {
    let mut rig = Rig::new(ControllerConfig::default());
    let mut store = MockStore::new();
    rig.run_period();

    rig.app.handle_command(AppCommand::SetSetpoint(250)).unwrap();
    for _ in 0..4 {
        rig.run_period();
        assert!(!rig.app.auto_save_if_needed(&mut store, &mut rig.sink));
    }
    rig.run_period();
    assert!(rig.app.auto_save_if_needed(&mut store, &mut rig.sink));
    assert!(!rig.app.is_config_dirty());
    assert_eq!(store.saved.len(), 1);
    assert_eq!(store.saved[0].setpoint, 250);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ConfigSaved)), 1);

    // Nothing further to save
    rig.run_periods(10);
    assert!(!rig.app.auto_save_if_needed(&mut store, &mut rig.sink));
}

#[test]
fn saved_config_restores_service() {
    let mut rig = Rig::new(ControllerConfig::default());
    let mut store = MockStore::new();
    rig.app.handle_command(AppCommand::SetUnits('C')).unwrap();
    rig.app.handle_command(AppCommand::SetSetpoint(110)).unwrap();
    assert!(rig.app.force_save_if_dirty(&mut store, &mut rig.sink));

    let restored = Rig::new(pitmaster::app::ports::ConfigPort::load(&store).unwrap());
    assert_eq!(restored.app.pid().setpoint(), 110);
    assert_eq!(restored.app.config().units.code(), 'C');
}
