//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the probe bank, PID controller, lid-open detector
//! and output modulator. It exposes a clean, hardware-agnostic API. All
//! I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!       Clock ──▶ │        AppService        │
//! ActuatorPort ◀──│ Probes · PID · Lid · Out │
//!                 └──────────────────────────┘
//! ```
//!
//! ## Cadence
//!
//! [`AppService::do_work`] is polled from the main loop as often as
//! convenient. Every `control_period_ms / sub_periods` it runs one work
//! unit (sample analog probes); every `sub_periods` work units it closes
//! a full control period (convert, alarms, PID, lid, outputs).

use log::{info, warn};

use crate::config::{ControllerConfig, Units};
use crate::control::lid::{LidOpenDetector, LidTransition};
use crate::control::output::OutputModulator;
use crate::control::pid::{PidController, PidTerm};
use crate::sensors::alarm::AlarmSide;
use crate::sensors::{PROBE_COUNT, ProbeBank, ProbeId, Sampling};

use super::commands::AppCommand;
use super::events::{AppEvent, PidStatus, StatusSnapshot};
use super::ports::{ActuatorPort, Clock, ConfigError, ConfigPort, EventSink, SensorPort};

/// Seconds after the last runtime change before the config is auto-saved.
const AUTO_SAVE_DELAY_SECS: u64 = 5;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: ControllerConfig,
    probes: ProbeBank,
    pid: PidController,
    lid: LidOpenDetector,
    output: OutputModulator,
    /// Clock reading at the last work unit.
    last_work_ms: u32,
    /// Work units in the current period. Starts saturated so the first
    /// work unit closes a period.
    sub_period: u8,
    period_count: u64,
    /// Alarm ringing state at the end of the previous period.
    ringing: [[bool; 2]; PROBE_COUNT],
    config_dirty: bool,
    dirty_since_period: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    pub fn new(config: ControllerConfig) -> Self {
        let sampling = Sampling::from_config(&config.timing);
        let mut probes = ProbeBank::new(sampling);
        probes.configure(&config.probes, sampling);

        let pid = PidController::new(config.setpoint, config.pid, config.timing.output_smoothing);
        let lid = LidOpenDetector::new(config.lid_open.duration_secs, config.lid_open.offset_percent);
        let output = OutputModulator::new(config.fan, config.servo, &config.timing);

        Self {
            config,
            probes,
            pid,
            lid,
            output,
            last_work_ms: 0,
            sub_period: u8::MAX,
            period_count: 0,
            ringing: [[false; 2]; PROBE_COUNT],
            config_dirty: false,
            dirty_since_period: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            setpoint: self.pid.setpoint(),
        });
        info!(
            "AppService started, setpoint {}{}",
            self.pid.setpoint(),
            self.config.units.code()
        );
    }

    // ── Per-work-unit orchestration ───────────────────────────

    /// Run a work unit if one is due. Returns `true` when a full control
    /// period completed.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn do_work(
        &mut self,
        clock: &impl Clock,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> bool {
        let now = clock.now_ms();
        if now.wrapping_sub(self.last_work_ms) < self.config.sub_period_ms() {
            return false;
        }
        self.last_work_ms = now;

        // 1. A boost started last work unit has run its course
        self.output.end_boost(hw);

        // 2. Sample every analog probe
        self.probes.sample_analog(hw);

        self.sub_period = self.sub_period.saturating_add(1);
        if self.sub_period < self.config.timing.sub_periods {
            return false;
        }
        self.sub_period = 0;
        self.period_count += 1;

        // 3. Close the window on every probe; alarms evaluate inside
        self.probes
            .finalize_all(self.config.units, self.lid.is_lid_open());
        self.emit_alarm_transitions(sink);

        // 4. Control, unless the output is pinned
        if !self.pid.is_manual() {
            let period_secs = self.period_secs();
            let pit = self.probes.pit();
            let (temp, avg) = (pit.temperature(), pit.average());
            self.pid.evaluate(temp, avg, self.lid.is_lid_open());

            for transition in self.lid.evaluate(temp, &mut self.pid, period_secs) {
                sink.emit(&match transition {
                    LidTransition::SetpointReached => AppEvent::SetpointReached {
                        setpoint: self.pid.setpoint(),
                    },
                    LidTransition::Resumed => AppEvent::LidResumed,
                    LidTransition::Opened(countdown) => AppEvent::LidOpened { countdown },
                });
            }
        }

        // 5. Commit outputs
        self.pid.update_output_average();
        self.output.commit(self.pid.output(), hw);

        // 6. Periodic status
        let interval = u64::from(self.config.timing.status_interval_periods);
        if interval != 0 && self.period_count % interval == 0 {
            sink.emit(&AppEvent::Status(self.build_status()));
            if let Some(pid) = self.pid_status() {
                sink.emit(&AppEvent::Pid(pid));
            }
        }

        true
    }

    /// Deliver a raw oversampled value for an externally acquired probe.
    pub fn feed_raw(&mut self, probe: ProbeId, value: u32) {
        self.probes.feed_raw(probe, value);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    ///
    /// Rejected commands leave all state unchanged.
    pub fn handle_command(&mut self, cmd: AppCommand) -> Result<(), ConfigError> {
        match cmd {
            AppCommand::SetSetpoint(value) => {
                self.pid.set_setpoint(value);
                self.lid.reset_countdown();
                self.config.setpoint = value;
                self.mark_config_dirty();
            }
            AppCommand::SetManualOutput(value) => {
                self.pid.set_output(value);
                self.lid.reset_countdown();
            }
            AppCommand::SetPidGain(term, value) => {
                if !value.is_finite() {
                    return Err(ConfigError::ValidationFailed("PID gains must be finite"));
                }
                self.pid.set_gain(term, value);
                let gains = &mut self.config.pid;
                match term {
                    PidTerm::Bias => gains.bias = value,
                    PidTerm::Proportional => gains.proportional = value,
                    PidTerm::Integral => gains.integral = value,
                    PidTerm::Derivative => gains.derivative = value,
                }
                self.mark_config_dirty();
            }
            AppCommand::SetUnits(code) => {
                let units = Units::try_from(code).inspect_err(|_| {
                    warn!("Ignoring unknown units '{}'", code);
                })?;
                if units != self.config.units {
                    info!("Units changed to {}", units.code());
                    self.config.units = units;
                    self.mark_config_dirty();
                }
            }
            AppCommand::SetProbeKind(probe, kind) => {
                self.probes.probe_mut(probe).set_kind(kind);
                self.config.probes[probe.index()].kind = kind;
                info!("Probe {:?} kind set to {:?}", probe, kind);
                self.mark_config_dirty();
            }
            AppCommand::SetProbeOffset(probe, offset) => {
                self.probes.probe_mut(probe).set_offset(offset);
                self.config.probes[probe.index()].offset = offset;
                self.mark_config_dirty();
            }
            AppCommand::SetAlarmThresholds { probe, low, high } => {
                let alarm = self.probes.probe_mut(probe).alarm_mut();
                alarm.set_low(low);
                alarm.set_high(high);
                let cfg = &mut self.config.probes[probe.index()];
                if low != 0 {
                    cfg.alarm_low = low;
                }
                if high != 0 {
                    cfg.alarm_high = high;
                }
                self.ringing[probe.index()] = [false; 2];
                self.mark_config_dirty();
            }
            AppCommand::SetLidOpen {
                offset_percent,
                duration_secs,
            } => {
                if offset_percent > 100 {
                    return Err(ConfigError::ValidationFailed("lid offset_percent must be 0–100"));
                }
                self.lid.set_offset(offset_percent);
                self.lid.set_duration(duration_secs);
                self.config.lid_open.offset_percent = offset_percent;
                self.config.lid_open.duration_secs = self.lid.duration();
                self.mark_config_dirty();
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate().inspect_err(|e| {
                    warn!("Rejected configuration update: {}", e);
                })?;
                self.apply_config(*new_config);
                self.mark_config_dirty();
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.dirty_since_period = 0;
                self.mark_config_dirty();
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current state.
    pub fn build_status(&self) -> StatusSnapshot {
        StatusSnapshot {
            setpoint: self.pid.setpoint(),
            temperatures: self.probes.temperatures(),
            output: self.pid.output(),
            output_average: self.pid.output_average(),
            lid_countdown: self.lid.countdown(),
            fan_duty: self.output.fan_duty(),
            servo_pulse_us: self.output.servo_pulse_us(),
            manual: self.pid.is_manual(),
        }
    }

    /// PID term breakdown; `None` while the pit probe is invalid.
    pub fn pid_status(&self) -> Option<PidStatus> {
        let pit = self.probes.pit();
        let temp = pit.temperature()?;
        let avg = pit.average().unwrap_or(temp);
        let terms = self.pid.terms();
        Some(PidStatus {
            bias: terms[PidTerm::Bias as usize],
            proportional: terms[PidTerm::Proportional as usize],
            integral: terms[PidTerm::Integral as usize],
            derivative: terms[PidTerm::Derivative as usize],
            temperature_delta: temp - avg,
        })
    }

    pub fn probes(&self) -> &ProbeBank {
        &self.probes
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn lid(&self) -> &LidOpenDetector {
        &self.lid
    }

    pub fn output(&self) -> &OutputModulator {
        &self.output
    }

    /// Full control periods completed since startup.
    pub fn period_count(&self) -> u64 {
        self.period_count
    }

    /// The live configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn period_secs(&self) -> u16 {
        (self.config.timing.control_period_ms / 1000) as u16
    }

    fn apply_config(&mut self, config: ControllerConfig) {
        let sampling = Sampling::from_config(&config.timing);
        self.probes.configure(&config.probes, sampling);

        if config.setpoint != self.pid.setpoint() {
            self.pid.set_setpoint(config.setpoint);
            self.lid.reset_countdown();
        }
        self.pid.set_gains(config.pid);
        self.pid.set_output_smoothing(config.timing.output_smoothing);

        self.lid.set_duration(config.lid_open.duration_secs);
        self.lid.set_offset(config.lid_open.offset_percent);
        self.output
            .configure(config.fan, config.servo, &config.timing);

        self.config = config;
    }

    fn emit_alarm_transitions(&mut self, sink: &mut impl EventSink) {
        for id in ProbeId::ALL {
            let alarm = self.probes.probe(id).alarm();
            for side in AlarmSide::BOTH {
                let now = alarm.is_ringing(side);
                let was = &mut self.ringing[id.index()][side as usize];
                if now && !*was {
                    warn!(
                        "Alarm: {} {:?} ringing",
                        self.config.probes[id.index()].name,
                        side
                    );
                    sink.emit(&AppEvent::AlarmRinging { probe: id, side });
                }
                *was = now;
            }
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_period = self.period_count;
        }
    }

    /// Check if auto-save should trigger (5 seconds after last change).
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(
        &mut self,
        storage: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.config_dirty {
            return false;
        }
        let periods_since_dirty = self.period_count.saturating_sub(self.dirty_since_period);
        let secs_since_dirty = periods_since_dirty * u64::from(self.period_secs());
        if secs_since_dirty < AUTO_SAVE_DELAY_SECS {
            return false;
        }
        self.save(storage, sink)
    }

    /// Force-save if dirty (call before a controlled shutdown).
    pub fn force_save_if_dirty(
        &mut self,
        storage: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.config_dirty && self.save(storage, sink)
    }

    fn save(&mut self, storage: &mut impl ConfigPort, sink: &mut impl EventSink) -> bool {
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config saved");
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
