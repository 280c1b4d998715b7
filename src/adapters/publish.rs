//! Publishing event sink: routes events onto pub/sub topics.
//!
//! | Event                         | Topic            | Payload            |
//! |-------------------------------|------------------|--------------------|
//! | `ZoneInitial` / `ZoneChanged` | general          | message            |
//! |                               | zone channel     | `{"value":0\|1}`   |
//! | siren events                  | siren            | message            |
//! | `CodeAcknowledged`            | alarm management | `0`                |
//! | everything else               | general          | message            |
//!
//! Delivery is best-effort. A failed publish is logged and counted; the
//! event is not retried.

use log::{debug, warn};
use serde::Serialize;

use crate::app::events::{AppEvent, Severity};
use crate::app::ports::{EventSink, TelemetryError, TelemetryPort};
use crate::config::SystemConfig;

/// Topic names taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub general: String,
    pub alarm: String,
    pub siren: String,
}

impl Topics {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            general: config.general_topic.clone(),
            alarm: config.alarm_topic.clone(),
            siren: config.siren_topic.clone(),
        }
    }
}

#[derive(Serialize)]
struct ZoneValue {
    value: u8,
}

pub struct PublishingSink<T: TelemetryPort> {
    telemetry: T,
    topics: Topics,
    failures: u32,
}

impl<T: TelemetryPort> PublishingSink<T> {
    pub fn new(telemetry: T, topics: Topics) -> Self {
        Self {
            telemetry,
            topics,
            failures: 0,
        }
    }

    /// Publishes that have failed since boot.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    fn send(&mut self, topic: &str, message: &str, severity: Severity) {
        if let Err(e) = self.telemetry.publish(topic, message, severity) {
            self.failures = self.failures.saturating_add(1);
            warn!(
                "Publish: {} dropped ({}, {} failures)",
                topic, e, self.failures
            );
        }
    }

    fn send_zone_value(&mut self, channel: &str, value: u8) {
        match serde_json::to_string(&ZoneValue { value }) {
            Ok(payload) => self.send(channel, &payload, Severity::Info),
            Err(e) => warn!("Publish: zone value for {} not encoded ({})", channel, e),
        }
    }
}

impl<T: TelemetryPort> EventSink for PublishingSink<T> {
    fn emit(&mut self, event: &AppEvent) {
        let severity = event.severity();
        match event {
            AppEvent::ZoneInitial { channel, state, .. }
            | AppEvent::ZoneChanged {
                channel, to: state, ..
            } => {
                let general = self.topics.general.clone();
                self.send(&general, &event.to_string(), severity);
                self.send_zone_value(channel, state.as_value());
            }
            AppEvent::SirenAlreadyActive
            | AppEvent::SirenTriggered(_)
            | AppEvent::SirenSilenced { .. } => {
                let siren = self.topics.siren.clone();
                self.send(&siren, &event.to_string(), severity);
            }
            AppEvent::CodeAcknowledged => {
                let alarm = self.topics.alarm.clone();
                self.send(&alarm, "0", severity);
            }
            _ => {
                let general = self.topics.general.clone();
                self.send(&general, &event.to_string(), severity);
            }
        }
    }
}

/// Telemetry stand-in that writes every publish to the debug log.
///
/// Used when no broker client is linked in.
pub struct LogTelemetry;

impl TelemetryPort for LogTelemetry {
    fn publish(
        &mut self,
        topic: &str,
        message: &str,
        severity: Severity,
    ) -> Result<(), TelemetryError> {
        debug!("PUB [{}] {} | {}", severity, topic, message);
        Ok(())
    }
}
