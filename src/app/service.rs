//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the zone monitors, the alarm controller and the
//! siren. It exposes one operation per scheduler task; all I/O flows
//! through the pins it was built with and the [`EventSink`] passed in at
//! each call, so the whole service runs against mocks on the host.
//!
//! ```text
//!  InputPin ×n ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          AppService           │
//!  CommandPort ──▶ │ Zones · AlarmController · Siren│ ──▶ OutputPin ×2
//!  KeyPort ──────▶ └──────────────────────────────┘ ──▶ StoragePort
//! ```

use core::time::Duration;

use burster::Limiter;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::alarm::{AlarmController, CodeOutcome};
use crate::config::SystemConfig;
use crate::drivers::keys::LocalKey;
use crate::drivers::siren::{SilenceReason, SirenDriver, SirenMode};
use crate::drivers::watchdog::ResetReason;
use crate::sensors::zone::{SensorState, ZoneMonitor, ZoneReport, ZoneStatus};
use crate::store::PersistentStateStore;

use super::commands::{AppCommand, Inbound};
use super::events::{AppEvent, Notice};
use super::ports::{EventSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<Z: InputPin, O: OutputPin, S: StoragePort> {
    zones: Vec<ZoneMonitor<Z>>,
    alarm: AlarmController<S>,
    siren: SirenDriver<O>,
    /// Optional brute-force guard on code comparisons.
    code_gate: Option<burster::TokenBucket<fn() -> Duration>>,
    yelp_on_rejected_arm: bool,
}

impl<Z: InputPin, O: OutputPin, S: StoragePort> AppService<Z, O, S> {
    /// Build the service and restore the persisted arming state.
    ///
    /// Does **not** announce anything; call [`start`](Self::start) next.
    pub fn new(
        config: &SystemConfig,
        zones: Vec<ZoneMonitor<Z>>,
        siren: SirenDriver<O>,
        store: PersistentStateStore<S>,
    ) -> Self {
        Self {
            zones,
            alarm: AlarmController::restore(config.alarm_code, store),
            siren,
            code_gate: config.code_attempt_limit.map(|limit| {
                // `limit` tokens per second, `limit` burst capacity.
                burster::TokenBucket::new_with_time_provider(
                    u64::from(limit),
                    u64::from(limit),
                    platform_now as fn() -> Duration,
                )
            }),
            yelp_on_rejected_arm: config.yelp_on_rejected_arm,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the restored state.
    pub fn start(&mut self, reset: ResetReason, sink: &mut impl EventSink) {
        info!(
            "AppService started ({} zones, {}, reset: {})",
            self.zones.len(),
            self.alarm.arm_state(),
            reset
        );
        sink.emit(&AppEvent::Started {
            armed: self.alarm.arm_state(),
            exclusions: self.alarm.exclusions().clone(),
            reset,
        });
    }

    // ── Task bodies ───────────────────────────────────────────

    /// Zone task: sample, report, and sound the siren on an armed intrusion.
    ///
    /// A zone found open on its first check after boot counts as an
    /// intrusion too, so a reset cannot mask a door left open.
    pub fn run_zone(&mut self, index: usize, sink: &mut impl EventSink) {
        let Some(zone) = self.zones.get_mut(index) else {
            warn!("AppService: no zone at index {}", index);
            return;
        };

        let opened = matches!(
            zone.poll(sink),
            ZoneReport::Initial(SensorState::Open)
                | ZoneReport::Changed {
                    from: SensorState::Closed,
                    to: SensorState::Open,
                }
        );
        if !opened || !self.alarm.is_armed() {
            return;
        }

        if self.alarm.zone_is_excluded(zone.channel()) {
            sink.emit(&AppEvent::ZoneExcluded {
                channel: zone.channel().to_owned(),
            });
        } else if !self.siren.trigger(SirenMode::Steady, sink) {
            sink.emit(&AppEvent::SirenAlreadyActive);
        }
    }

    /// Command-intake task body for one delivery.
    pub fn handle_inbound(&mut self, inbound: &Inbound, sink: &mut impl EventSink) {
        match AppCommand::from_inbound(inbound) {
            Ok(Some(cmd)) => self.handle_command(cmd, sink),
            Ok(None) => {}
            Err(e) => {
                warn!("AppService: ignoring {:?} payload ({})", inbound.channel, e);
                sink.emit(&AppEvent::Notice(Notice::warning(format!(
                    "Unknown request: {}",
                    inbound.payload.trim()
                ))));
            }
        }
    }

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::SubmitCode(raw) => {
                sink.emit(&AppEvent::Notice(Notice::info("Request to arm/disarm system")));
                let notice = self.submit_gated(&raw, sink);
                sink.emit(&AppEvent::Notice(notice));
                sink.emit(&AppEvent::CodeAcknowledged);
            }
            AppCommand::QueryArmState => {
                let notice = Notice::info(format!("System is {}", self.alarm.arm_state()));
                sink.emit(&AppEvent::Notice(notice));
            }
            AppCommand::QueryExclusions => {
                let exclusions = self.alarm.exclusions();
                let notice = if exclusions.is_empty() {
                    Notice::info("No excluded zones")
                } else {
                    Notice::info(format!("Excluded zones: {}", exclusions))
                };
                sink.emit(&AppEvent::Notice(notice));
            }
            AppCommand::QueryZones => {
                for zone in &self.zones {
                    let notice = Notice::info(format!("{}: {}", zone.name(), zone.sensor_state()));
                    sink.emit(&AppEvent::Notice(notice));
                }
            }
        }
    }

    /// Local-input task body for one key press.
    pub fn handle_key(&mut self, key: LocalKey, sink: &mut impl EventSink) {
        match key {
            LocalKey::Panic => {
                if !self.siren.is_sounding() {
                    self.siren.trigger(SirenMode::Steady, sink);
                }
            }
            LocalKey::Silence => {
                self.siren.disable(SilenceReason::Operator, sink);
            }
        }
    }

    /// Siren-dismiss task body.
    pub fn dismiss_tick(&mut self, sink: &mut impl EventSink) {
        self.siren.tick_dismiss(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn zones(&self) -> &[ZoneMonitor<Z>] {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut [ZoneMonitor<Z>] {
        &mut self.zones
    }

    pub fn alarm(&self) -> &AlarmController<S> {
        &self.alarm
    }

    pub fn siren(&self) -> &SirenDriver<O> {
        &self.siren
    }

    pub fn is_armed(&self) -> bool {
        self.alarm.is_armed()
    }

    // ── Internal ──────────────────────────────────────────────

    fn submit_gated(&mut self, raw: &str, sink: &mut impl EventSink) -> Notice {
        let gate = &mut self.code_gate;
        let outcome = self.alarm.submit_with(
            raw,
            self.zones.as_slice(),
            &mut self.siren,
            sink,
            || gate.as_mut().is_none_or(|bucket| bucket.try_consume(1).is_ok()),
        );
        if matches!(outcome, CodeOutcome::Blocked(_)) && self.yelp_on_rejected_arm {
            self.siren.trigger(SirenMode::Yelp, sink);
        }
        outcome.notice()
    }
}

// ── Platform time for the code gate ──────────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    // SAFETY: esp_timer_get_time reads a monotonic hardware counter.
    let us = unsafe { esp_idf_sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
