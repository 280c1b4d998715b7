//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the components it owns
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: log to serial,
//! publish to the general topic, mirror zone values on per-zone topics.
//!
//! `Display` renders the operator-facing message text; [`AppEvent::severity`]
//! gives the level it is published at.

use core::fmt;

use crate::alarm::state::{ArmState, ExclusionSet};
use crate::drivers::siren::{SilenceReason, SirenMode};
use crate::drivers::watchdog::ResetReason;
use crate::sensors::zone::SensorState;

/// Publish level attached to every outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing reply: one message and its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot completed; carries the restored arming state.
    Started {
        armed: ArmState,
        exclusions: ExclusionSet,
        reset: ResetReason,
    },

    /// First report of a zone after boot.
    ZoneInitial {
        name: String,
        channel: String,
        state: SensorState,
    },

    /// A zone input changed between two ticks.
    ZoneChanged {
        name: String,
        channel: String,
        from: SensorState,
        to: SensorState,
    },

    /// An armed zone opened but is in the exclusion set.
    ZoneExcluded { channel: String },

    /// A trigger arrived while the siren was already sounding.
    SirenAlreadyActive,

    SirenTriggered(SirenMode),

    SirenSilenced {
        mode: SirenMode,
        reason: SilenceReason,
    },

    /// Free-form reply, e.g. the outcome of a code submission.
    Notice(Notice),

    /// A code was processed; the alarm-management topic gets the `0` echo.
    CodeAcknowledged,
}

impl AppEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ZoneChanged { to, .. } if to.is_open() => Severity::Warning,
            Self::SirenTriggered(_) => Severity::Warning,
            Self::Notice(n) => n.severity,
            Self::CodeAcknowledged => Severity::Debug,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                armed: ArmState::Armed,
                exclusions,
                ..
            } if exclusions.is_empty() => write!(f, "System is armed with no zones excluded"),
            Self::Started {
                armed: ArmState::Armed,
                exclusions,
                ..
            } => write!(f, "System is armed with these zones excluded: {exclusions}"),
            Self::Started { reset, .. } => write!(f, "System is disarmed (reset: {reset})"),
            Self::ZoneInitial { name, state, .. } => {
                write!(f, "Publishing initial state for: {name}: {state}")
            }
            Self::ZoneChanged { name, from, to, .. } => {
                write!(f, "{name} state has changed from: {from} to {to}")
            }
            Self::ZoneExcluded { channel } => write!(f, "This {channel} is in the exclude list"),
            Self::SirenAlreadyActive => write!(f, "Siren is already active"),
            Self::SirenTriggered(mode) => write!(f, "Siren {mode} triggered"),
            Self::SirenSilenced { mode, reason } => write!(f, "Siren {mode} disabled ({reason})"),
            Self::Notice(n) => f.write_str(&n.message),
            Self::CodeAcknowledged => write!(f, "0"),
        }
    }
}
