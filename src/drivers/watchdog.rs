//! Task Watchdog Timer (TWDT) driver and the heartbeat supervisor.
//!
//! ```text
//!   Scheduler ─▶ Heartbeat task ─▶ WatchdogSupervisor::heartbeat()
//!                                        │ every `feed_every` ticks
//!                                        ▼
//!                                  WatchdogPort::feed()  (TaskWatchdog)
//! ```
//!
//! The heartbeat is the last task of every tick, so a feed proves that every
//! zone, command and siren task has returned since the previous one. If any
//! of them stalls the TWDT panics and the chip resets; nothing in software
//! handles that case.

use core::fmt;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::{WatchdogError, WatchdogPort};
use crate::error::{ConfigError, Error};

// ── Hardware facility ─────────────────────────────────────────

/// The ESP-IDF task watchdog, subscribed for the calling task.
pub struct TaskWatchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    armed_timeout_ms: Option<u32>,
    #[cfg(not(target_os = "espidf"))]
    feeds: u32,
}

impl Default for TaskWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskWatchdog {
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            Self { subscribed: false }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            Self {
                armed_timeout_ms: None,
                feeds: 0,
            }
        }
    }

    /// Timeout the simulated watchdog was armed with.
    #[cfg(not(target_os = "espidf"))]
    pub fn armed_timeout_ms(&self) -> Option<u32> {
        self.armed_timeout_ms
    }

    /// Number of feeds seen by the simulated watchdog.
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

impl WatchdogPort for TaskWatchdog {
    #[cfg(target_os = "espidf")]
    fn arm(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: called once from the scheduler thread during boot.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK {
            return Err(WatchdogError::ConfigRejected(ret));
        }

        // SAFETY: a null handle subscribes the calling task.
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        if ret != ESP_OK {
            return Err(WatchdogError::SubscribeFailed(ret));
        }
        self.subscribed = true;
        info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        info!("Watchdog(sim): armed ({} ms)", timeout_ms);
        self.armed_timeout_ms = Some(timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the TWDT entry of the subscribed task.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.feeds += 1;
        }
    }
}

// ── Supervisor ────────────────────────────────────────────────

/// Feeds the watchdog from the Heartbeat task at a period strictly below
/// half the timeout.
pub struct WatchdogSupervisor<W: WatchdogPort> {
    port: W,
    tick_ms: u32,
    feed_every: u32,
    since_feed: u32,
}

impl<W: WatchdogPort> WatchdogSupervisor<W> {
    pub fn new(port: W, tick_ms: u32) -> Self {
        Self {
            port,
            tick_ms,
            feed_every: 0,
            since_feed: 0,
        }
    }

    /// Arm the hardware and derive the heartbeat period.
    ///
    /// Rejects a tick too coarse for `period × tick < timeout / 2`.
    pub fn arm(&mut self, timeout_ms: u32) -> Result<(), Error> {
        let feed_every = heartbeat_period(timeout_ms, self.tick_ms).ok_or(Error::Config(
            ConfigError::Invalid("watchdog timeout too short for tick interval"),
        ))?;
        self.port.arm(timeout_ms).map_err(Error::Watchdog)?;
        self.feed_every = feed_every;
        self.since_feed = 0;
        info!(
            "Watchdog: heartbeat every {} ticks ({} ms, timeout {} ms)",
            feed_every,
            feed_every * self.tick_ms,
            timeout_ms
        );
        Ok(())
    }

    /// Heartbeat task body: feeds when the period is due.
    pub fn heartbeat(&mut self) {
        if self.feed_every == 0 {
            return;
        }
        self.since_feed += 1;
        if self.since_feed >= self.feed_every {
            self.feed();
        }
    }

    pub fn feed(&mut self) {
        self.port.feed();
        self.since_feed = 0;
    }

    pub fn feed_every(&self) -> u32 {
        self.feed_every
    }

    pub fn port(&self) -> &W {
        &self.port
    }
}

/// Largest tick count `n ≥ 1` with `n × tick_ms < timeout_ms / 2`.
pub fn heartbeat_period(timeout_ms: u32, tick_ms: u32) -> Option<u32> {
    if tick_ms == 0 {
        return None;
    }
    // n·tick < timeout/2  ⇔  2·n·tick ≤ timeout − 1
    let n = timeout_ms.checked_sub(1)? / (2 * tick_ms);
    (n >= 1).then_some(n)
}

// ── Reset reason ──────────────────────────────────────────────

/// Cause of the last reset, reported in the boot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    PowerOn,
    Watchdog,
    Panic,
    Other,
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOn => write!(f, "power-on"),
            Self::Watchdog => write!(f, "watchdog"),
            Self::Panic => write!(f, "panic"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(target_os = "espidf")]
#[allow(non_upper_case_globals)]
pub fn reset_reason() -> ResetReason {
    // SAFETY: reads a value latched by the ROM at boot.
    match unsafe { esp_reset_reason() } {
        esp_reset_reason_t_ESP_RST_POWERON => ResetReason::PowerOn,
        esp_reset_reason_t_ESP_RST_TASK_WDT
        | esp_reset_reason_t_ESP_RST_INT_WDT
        | esp_reset_reason_t_ESP_RST_WDT => ResetReason::Watchdog,
        esp_reset_reason_t_ESP_RST_PANIC => ResetReason::Panic,
        _ => ResetReason::Other,
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn reset_reason() -> ResetReason {
    ResetReason::PowerOn
}
