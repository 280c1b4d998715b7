//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured line to the ESP-IDF logger (UART / USB-CDC in production).
//! The publishing sink in [`super::publish`] implements the same trait.

use log::{debug, error, info, warn};

use crate::app::events::{AppEvent, Severity};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let tag = match event {
            AppEvent::Started { .. } => "START",
            AppEvent::ZoneInitial { .. } | AppEvent::ZoneChanged { .. } => "ZONE ",
            AppEvent::ZoneExcluded { .. } => "EXCL ",
            AppEvent::SirenAlreadyActive
            | AppEvent::SirenTriggered(_)
            | AppEvent::SirenSilenced { .. } => "SIREN",
            AppEvent::Notice(_) => "NOTE ",
            AppEvent::CodeAcknowledged => "ACK  ",
        };
        match event.severity() {
            Severity::Debug => debug!("{} | {}", tag, event),
            Severity::Info => info!("{} | {}", tag, event),
            Severity::Warning => warn!("{} | {}", tag, event),
            Severity::Error | Severity::Critical => error!("{} | {}", tag, event),
        }
    }
}
