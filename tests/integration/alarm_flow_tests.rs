//! Integration tests: scheduler → ControllerTasks → AppService → pins.

use zonewatch::alarm::state::ArmState;
use zonewatch::app::events::{AppEvent, Severity};
use zonewatch::app::service::AppService;
use zonewatch::app::tasks::ControllerTasks;
use zonewatch::config::SystemConfig;
use zonewatch::drivers::keys::LocalKey;
use zonewatch::drivers::siren::{SilenceReason, SirenDriver, SirenMode, SirenState};
use zonewatch::drivers::watchdog::{ResetReason, WatchdogSupervisor};
use zonewatch::scheduler::Scheduler;
use zonewatch::sensors::{SensorState, ZoneMonitor};
use zonewatch::store::PersistentStateStore;

use super::mock_hw::{
    MemStorage, MockPin, MockWatchdog, QueuedCommands, RecordingSink, ScriptedKeys, test_config,
};

pub struct Rig {
    pub app: AppService<MockPin, MockPin, MemStorage>,
    pub zones: Vec<MockPin>,
    pub steady: MockPin,
    pub yelp: MockPin,
    pub sink: RecordingSink,
    pub commands: QueuedCommands,
    pub keys: ScriptedKeys,
    pub watchdog: WatchdogSupervisor<MockWatchdog>,
    scheduler: Scheduler,
}

impl Rig {
    pub fn boot(config: &SystemConfig, storage: MemStorage) -> Self {
        let zones: Vec<MockPin> = config.zones.iter().map(|_| MockPin::default()).collect();
        let monitors = config
            .zones
            .iter()
            .zip(&zones)
            .map(|(z, pin)| ZoneMonitor::new(z, pin.clone()))
            .collect();
        let steady = MockPin::default();
        let yelp = MockPin::default();
        let siren = SirenDriver::new(steady.clone(), yelp.clone(), config.siren_timeout_ticks());

        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config, monitors, siren, PersistentStateStore::new(storage));
        app.start(ResetReason::PowerOn, &mut sink);

        let mut watchdog = WatchdogSupervisor::new(MockWatchdog::default(), config.tick_interval_ms);
        watchdog
            .arm(config.watchdog_timeout_ms)
            .expect("watchdog arms");

        Self {
            app,
            zones,
            steady,
            yelp,
            sink,
            commands: QueuedCommands::default(),
            keys: ScriptedKeys::default(),
            watchdog,
            scheduler: Scheduler::new(config.zones.len()).expect("zone count fits"),
        }
    }

    pub fn tick(&mut self) {
        let mut tasks = ControllerTasks::new(
            &mut self.app,
            &mut self.sink,
            &mut self.commands,
            &mut self.keys,
            &mut self.watchdog,
        );
        self.scheduler.tick(&mut tasks);
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn submit(&mut self, raw: &str) {
        self.commands.code(raw);
        self.tick();
    }

    pub fn siren_state(&self) -> SirenState {
        self.app.siren().state()
    }
}

fn notice_messages(sink: &RecordingSink) -> Vec<String> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Notice(n) => Some(n.message.clone()),
            _ => None,
        })
        .collect()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_reports_every_zone_once() {
    let mut rig = Rig::boot(&test_config(3), MemStorage::default());
    assert_eq!(rig.sink.events[0].to_string(), "System is disarmed (reset: power-on)");

    rig.ticks(3);
    let initial = rig
        .sink
        .count(|e| matches!(e, AppEvent::ZoneInitial { .. }));
    assert_eq!(initial, 3);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ZoneChanged { .. })),
        0
    );
}

#[test]
fn zone_open_while_disarmed_only_reports() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.tick();
    rig.zones[0].set_high(true);
    rig.tick();

    let changed: Vec<&AppEvent> = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ZoneChanged { .. }))
        .collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].severity(), Severity::Warning);
    assert_eq!(rig.siren_state(), SirenState::Idle);
}

// ── Arm / disarm ──────────────────────────────────────────────

#[test]
fn arm_then_intrusion_sounds_steady() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.tick();
    rig.submit("1234");
    assert_eq!(rig.app.alarm().arm_state(), ArmState::Armed);
    assert_eq!(
        notice_messages(&rig.sink),
        ["Request to arm/disarm system", "System armed"]
    );
    assert!(matches!(rig.sink.events.last(), Some(AppEvent::CodeAcknowledged)));

    rig.zones[1].set_high(true);
    rig.tick();
    assert_eq!(rig.siren_state(), SirenState::Sounding(SirenMode::Steady));
    assert!(!rig.steady.is_high(), "steady output is active-low");
    assert!(rig.yelp.is_high());
}

#[test]
fn second_intrusion_reports_siren_already_active() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.tick();
    rig.submit("1234");
    rig.zones[0].set_high(true);
    rig.tick();
    rig.zones[1].set_high(true);
    rig.tick();

    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SirenTriggered(SirenMode::Steady))),
        1
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SirenAlreadyActive)),
        1
    );
}

#[test]
fn excluded_zone_opens_silently() {
    let mut rig = Rig::boot(&test_config(3), MemStorage::default());
    rig.tick();
    rig.submit("12343");
    assert!(rig.app.is_armed());
    assert!(rig.app.alarm().exclusions().contains("zone-3"));

    rig.zones[2].set_high(true);
    rig.tick();
    assert_eq!(rig.siren_state(), SirenState::Idle);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ZoneExcluded { channel } if channel == "monitoring.zone-3"
    )));
}

#[test]
fn open_zone_blocks_arming_unless_excluded() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.zones[0].set_high(true);
    rig.tick();

    rig.submit("1234");
    assert!(!rig.app.is_armed());
    assert!(notice_messages(&rig.sink).contains(
        &"Cannot arm system; the following zone(s) are open: Zone 1".to_string()
    ));
    assert_eq!(rig.siren_state(), SirenState::Idle);

    rig.submit("12341");
    assert!(rig.app.is_armed());
}

#[test]
fn rejected_arm_yelps_when_configured() {
    let mut config = test_config(1);
    config.yelp_on_rejected_arm = true;
    let mut rig = Rig::boot(&config, MemStorage::default());
    rig.zones[0].set_high(true);
    rig.tick();

    rig.submit("1234");
    assert_eq!(rig.siren_state(), SirenState::Sounding(SirenMode::Yelp));
    assert!(!rig.yelp.is_high());
    assert!(rig.steady.is_high());
}

#[test]
fn disarm_silences_and_clears_exclusions() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.tick();
    rig.submit("12342");
    rig.zones[0].set_high(true);
    rig.tick();
    assert!(rig.app.siren().is_sounding());

    rig.submit("1234");
    assert!(!rig.app.is_armed());
    assert!(rig.app.alarm().exclusions().is_empty());
    assert_eq!(rig.siren_state(), SirenState::Idle);
    assert!(rig.steady.is_high());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::SirenSilenced {
            reason: SilenceReason::Disarm,
            ..
        }
    )));
}

#[test]
fn wrong_code_changes_nothing_but_records_exclusions() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.tick();
    rig.submit("99995");
    assert!(!rig.app.is_armed());
    assert!(rig.app.alarm().exclusions().contains("zone-5"));
    assert_eq!(
        notice_messages(&rig.sink).last().map(String::as_str),
        Some("Incorrect code, system state unchanged")
    );
}

#[test]
fn malformed_code_is_answered_as_incorrect() {
    let mut rig = Rig::boot(&test_config(1), MemStorage::default());
    rig.tick();
    rig.submit("12a4");
    assert!(!rig.app.is_armed());
    assert!(rig.app.alarm().exclusions().is_empty());
    assert_eq!(
        notice_messages(&rig.sink).last().map(String::as_str),
        Some("Incorrect code, system state unchanged")
    );
}

#[test]
fn acknowledgement_echo_is_ignored() {
    let mut rig = Rig::boot(&test_config(1), MemStorage::default());
    rig.tick();
    rig.sink.clear();
    rig.submit("0");
    assert!(rig.sink.events.is_empty());
}

#[test]
fn one_command_per_tick() {
    let mut rig = Rig::boot(&test_config(1), MemStorage::default());
    rig.tick();
    rig.commands.code("1234");
    rig.commands.code("1234");
    rig.tick();
    assert!(rig.app.is_armed());
    rig.tick();
    assert!(!rig.app.is_armed());
}

// ── Siren ─────────────────────────────────────────────────────

#[test]
fn siren_auto_dismisses_once() {
    let mut config = test_config(1);
    config.siren_timeout_secs = 1; // 4 ticks at 250 ms
    let mut rig = Rig::boot(&config, MemStorage::default());
    rig.tick();
    rig.submit("1234");
    rig.zones[0].set_high(true);
    rig.tick();
    assert!(rig.app.siren().is_sounding());

    rig.ticks(3);
    assert!(rig.app.siren().is_sounding());
    rig.tick();
    assert!(!rig.app.siren().is_sounding());

    rig.ticks(10);
    let timeouts = rig.sink.count(|e| {
        matches!(
            e,
            AppEvent::SirenSilenced {
                reason: SilenceReason::Timeout,
                ..
            }
        )
    });
    assert_eq!(timeouts, 1);
    // Still armed: the timeout silences, it does not disarm.
    assert!(rig.app.is_armed());
}

#[test]
fn local_keys_drive_the_siren() {
    let mut rig = Rig::boot(&test_config(1), MemStorage::default());
    rig.keys.0.push_back(LocalKey::Panic);
    rig.tick();
    assert_eq!(rig.siren_state(), SirenState::Sounding(SirenMode::Steady));

    rig.keys.0.push_back(LocalKey::Silence);
    rig.tick();
    assert_eq!(rig.siren_state(), SirenState::Idle);

    // Silence while idle: nothing to report.
    rig.sink.clear();
    rig.keys.0.push_back(LocalKey::Silence);
    rig.tick();
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SirenSilenced { .. })),
        0
    );
}

// ── Status requests ───────────────────────────────────────────

#[test]
fn status_requests_answer_on_general() {
    let mut rig = Rig::boot(&test_config(2), MemStorage::default());
    rig.zones[1].set_high(true);
    rig.tick();
    rig.sink.clear();

    rig.commands.status("alarm");
    rig.commands.status("exclusions");
    rig.commands.status("zones");
    rig.commands.status("reboot");
    rig.ticks(4);

    assert_eq!(
        notice_messages(&rig.sink),
        [
            "System is disarmed",
            "No excluded zones",
            "Zone 1: Closed",
            "Zone 2: Open",
            "Unknown request: reboot",
        ]
    );
    assert_eq!(
        rig.app.zones()[1].sensor_state(),
        SensorState::Open
    );
}

// ── Liveness ──────────────────────────────────────────────────

#[test]
fn heartbeat_feeds_below_half_timeout() {
    let mut config = test_config(1);
    config.watchdog_timeout_ms = 1200; // feed every 2 ticks
    let mut rig = Rig::boot(&config, MemStorage::default());
    assert_eq!(rig.watchdog.feed_every(), 2);

    rig.ticks(6);
    assert_eq!(rig.watchdog.port().feeds, 3);
    assert_eq!(rig.watchdog.port().armed_ms, Some(1200));
}

#[test]
fn rejected_watchdog_config_is_an_error() {
    let port = MockWatchdog {
        reject: true,
        ..MockWatchdog::default()
    };
    let mut supervisor = WatchdogSupervisor::new(port, 250);
    assert!(supervisor.arm(10_000).is_err());
    // Too coarse a tick for the timeout.
    let mut supervisor = WatchdogSupervisor::new(MockWatchdog::default(), 1000);
    assert!(supervisor.arm(1500).is_err());
}
