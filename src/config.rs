//! System configuration.
//!
//! Parsed once at boot from the JSON document embedded at build time
//! (`config/zonewatch.json`). Optional fields fall back to the defaults
//! below; `alarm_code` and `zones` are required. A document that fails to
//! parse or validate is fatal: there is no safe default for a secret code
//! or a zone list.

use serde::{Deserialize, Serialize};

use crate::alarm::channel_suffix;
use crate::drivers::watchdog::heartbeat_period;
use crate::error::ConfigError;
use crate::pins;

/// Upper bound on configured zones (one scheduler slot each).
pub const MAX_ZONES: usize = 16;

/// Largest accepted alarm code (four decimal digits).
pub const MAX_ALARM_CODE: u32 = 9999;

/// One monitored zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: u8,
    /// Human-readable name used in notices.
    pub name: String,
    /// External topic name; its last segment is the exclusion identifier.
    pub channel: String,
    pub gpio: i32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Arming ---
    /// Operator code, 0–9999.
    pub alarm_code: u32,
    pub zones: Vec<ZoneConfig>,

    // --- Outputs and keys ---
    #[serde(default = "default_siren_steady_gpio")]
    pub siren_steady_gpio: i32,
    #[serde(default = "default_siren_yelp_gpio")]
    pub siren_yelp_gpio: i32,
    #[serde(default)]
    pub panic_key_gpio: Option<i32>,
    #[serde(default)]
    pub silence_key_gpio: Option<i32>,

    // --- Timing ---
    /// Scheduler tick (milliseconds).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
    /// Siren auto-dismiss period without a silence action (seconds).
    #[serde(default = "default_siren_timeout_secs")]
    pub siren_timeout_secs: u32,
    /// Hardware watchdog timeout (milliseconds).
    #[serde(default = "default_watchdog_timeout_ms")]
    pub watchdog_timeout_ms: u32,

    // --- Behaviour ---
    /// Sound the yelp tone when an arming attempt is rejected for open zones.
    #[serde(default)]
    pub yelp_on_rejected_arm: bool,
    /// Code comparisons allowed per second, with the same burst. `None`
    /// evaluates every submission.
    #[serde(default)]
    pub code_attempt_limit: Option<u32>,

    // --- Topics ---
    #[serde(default = "default_general_topic")]
    pub general_topic: String,
    #[serde(default = "default_alarm_topic")]
    pub alarm_topic: String,
    #[serde(default = "default_siren_topic")]
    pub siren_topic: String,
}

fn default_siren_steady_gpio() -> i32 {
    pins::SIREN_STEADY_GPIO
}

fn default_siren_yelp_gpio() -> i32 {
    pins::SIREN_YELP_GPIO
}

fn default_tick_interval_ms() -> u32 {
    250
}

fn default_siren_timeout_secs() -> u32 {
    30
}

fn default_watchdog_timeout_ms() -> u32 {
    10_000
}

fn default_general_topic() -> String {
    "monitoring.general".into()
}

fn default_alarm_topic() -> String {
    "monitoring.alarm".into()
}

fn default_siren_topic() -> String {
    "monitoring.siren".into()
}

impl SystemConfig {
    /// Configuration with the given code and zones and defaults elsewhere.
    pub fn new(alarm_code: u32, zones: Vec<ZoneConfig>) -> Self {
        Self {
            alarm_code,
            zones,
            siren_steady_gpio: default_siren_steady_gpio(),
            siren_yelp_gpio: default_siren_yelp_gpio(),
            panic_key_gpio: None,
            silence_key_gpio: None,
            tick_interval_ms: default_tick_interval_ms(),
            siren_timeout_secs: default_siren_timeout_secs(),
            watchdog_timeout_ms: default_watchdog_timeout_ms(),
            yelp_on_rejected_arm: false,
            code_attempt_limit: None,
            general_topic: default_general_topic(),
            alarm_topic: default_alarm_topic(),
            siren_topic: default_siren_topic(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|e| {
            log::error!("Config: parse failed: {}", e);
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alarm_code > MAX_ALARM_CODE {
            return Err(ConfigError::Invalid("alarm_code must be 0–9999"));
        }
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        if self.zones.len() > MAX_ZONES {
            return Err(ConfigError::TooManyZones);
        }

        for (i, zone) in self.zones.iter().enumerate() {
            if zone.name.trim().is_empty() {
                return Err(ConfigError::Invalid("zone name must not be empty"));
            }
            if channel_suffix(&zone.channel).is_empty() {
                return Err(ConfigError::Invalid("zone channel must not end in a separator"));
            }
            for other in &self.zones[..i] {
                if other.id == zone.id {
                    return Err(ConfigError::Invalid("duplicate zone id"));
                }
                if channel_suffix(&other.channel) == channel_suffix(&zone.channel) {
                    return Err(ConfigError::Invalid("duplicate zone channel"));
                }
            }
        }

        if self.siren_steady_gpio == self.siren_yelp_gpio {
            return Err(ConfigError::Invalid("siren outputs must be distinct pins"));
        }
        if !(50..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::Invalid("tick_interval_ms must be 50–1000"));
        }
        if self.siren_timeout_secs == 0 {
            return Err(ConfigError::Invalid("siren_timeout_secs must be positive"));
        }
        if self.code_attempt_limit == Some(0) {
            return Err(ConfigError::Invalid("code_attempt_limit must be positive"));
        }
        if heartbeat_period(self.watchdog_timeout_ms, self.tick_interval_ms).is_none() {
            return Err(ConfigError::Invalid(
                "watchdog_timeout_ms must exceed two ticks",
            ));
        }
        Ok(())
    }

    /// Siren auto-dismiss period in scheduler ticks (rounded up).
    pub fn siren_timeout_ticks(&self) -> u32 {
        (self.siren_timeout_secs.saturating_mul(1000)).div_ceil(self.tick_interval_ms.max(1))
    }
}
