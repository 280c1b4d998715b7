//! Zonewatch firmware entry point
//!
//! Hexagonal core driven by a cooperative round-robin scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioInput ×n   GpioOutput ×2   NvsAdapter    TaskWatchdog     │
//! │  (zones, keys)  (siren)         (StoragePort) (WatchdogPort)   │
//! │  LogEventSink + PublishingSink  ConsoleCommands                │
//! │  (EventSink)                    (CommandPort)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Zones · AlarmController · SirenDriver                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (ControllerTasks) · WatchdogSupervisor              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use zonewatch::adapters::console::{self, CONSOLE_CHANNEL, ConsoleCommands};
use zonewatch::adapters::log_sink::LogEventSink;
use zonewatch::adapters::nvs::NvsAdapter;
use zonewatch::adapters::publish::{LogTelemetry, PublishingSink, Topics};
use zonewatch::app::service::AppService;
use zonewatch::app::tasks::ControllerTasks;
use zonewatch::config::SystemConfig;
use zonewatch::drivers::hw_init::{self, GpioInput, GpioOutput};
use zonewatch::drivers::keys::LocalKeys;
use zonewatch::drivers::siren::SirenDriver;
use zonewatch::drivers::watchdog::{self, TaskWatchdog, WatchdogSupervisor};
use zonewatch::scheduler::Scheduler;
use zonewatch::sensors::ZoneMonitor;
use zonewatch::store::PersistentStateStore;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Zonewatch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let reset = watchdog::reset_reason();
    info!("Boot: last reset {}", reset);

    // ── 2. Configuration (fatal if unusable) ──────────────────
    let config = SystemConfig::from_json(include_str!("../config/zonewatch.json"))
        .context("embedded configuration rejected")?;
    info!(
        "Config: {} zones, tick {} ms, siren timeout {} s",
        config.zones.len(),
        config.tick_interval_ms,
        config.siren_timeout_secs
    );

    // ── 3. Pins ───────────────────────────────────────────────
    hw_init::init_pins(&config).context("GPIO init failed")?;

    let zones: Vec<ZoneMonitor<GpioInput>> = config
        .zones
        .iter()
        .map(|z| ZoneMonitor::new(z, GpioInput::new(z.gpio)))
        .collect();
    let siren = SirenDriver::new(
        GpioOutput::new(config.siren_steady_gpio),
        GpioOutput::new(config.siren_yelp_gpio),
        config.siren_timeout_ticks(),
    );
    let mut keys = LocalKeys::new(
        config.panic_key_gpio.map(GpioInput::new),
        config.silence_key_gpio.map(GpioInput::new),
    );

    // ── 4. Persistent state ───────────────────────────────────
    let nvs = NvsAdapter::new().unwrap_or_else(|e| {
        warn!("NVS init failed ({}), arming state will not persist", e);
        NvsAdapter::unmounted()
    });
    let store = PersistentStateStore::new(nvs);

    // ── 5. Outbound sinks and command intake ──────────────────
    let mut sink = (
        LogEventSink::new(),
        PublishingSink::new(LogTelemetry, Topics::from_config(&config)),
    );
    let mut commands = ConsoleCommands::new(&CONSOLE_CHANNEL);
    if let Err(e) = console::spawn_reader() {
        warn!("Console reader not started ({}), no command input", e);
    }

    // ── 6. App service ────────────────────────────────────────
    let mut app = AppService::new(&config, zones, siren, store);
    app.start(reset, &mut sink);

    // ── 7. Watchdog, armed last so boot time does not count ───
    let mut supervisor = WatchdogSupervisor::new(TaskWatchdog::new(), config.tick_interval_ms);
    supervisor.arm(config.watchdog_timeout_ms)?;
    supervisor.feed();

    // ── 8. Scheduler loop ─────────────────────────────────────
    let mut scheduler = Scheduler::new(config.zones.len())?;
    info!("System ready. Entering scheduler loop.");
    let mut tasks = ControllerTasks::new(
        &mut app,
        &mut sink,
        &mut commands,
        &mut keys,
        &mut supervisor,
    );
    scheduler.run(
        &mut tasks,
        Duration::from_millis(u64::from(config.tick_interval_ms)),
    )
}
