//! Unified error types for the Zonewatch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level error handling uniform. All variants are `Copy` so they can be
//! passed through the controller and logged without allocation.
//!
//! | Category        | Handling                                          |
//! |-----------------|---------------------------------------------------|
//! | `Config`        | fatal at startup, no safe default exists          |
//! | `Storage`       | defaults on read, writes logged and retried lazily|
//! | `Protocol`      | warning, treated as an incorrect code             |
//! | `Telemetry`     | logged, counted, never affects controller state   |
//! | `Sensor`        | previous reading kept                             |
//! | `Actuator`      | logged, state machine continues                   |
//! | `Watchdog`      | fatal at startup                                  |

use core::fmt;

pub use crate::app::ports::{StorageError, TelemetryError, WatchdogError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Static configuration is missing or malformed.
    Config(ConfigError),
    /// The persistent medium could not be read or written.
    Storage(StorageError),
    /// An inbound command payload could not be interpreted.
    Protocol(ProtocolError),
    /// A notification could not be delivered.
    Telemetry(TelemetryError),
    /// A zone input could not be read.
    Sensor(SensorError),
    /// A siren output could not be driven.
    Actuator(ActuatorError),
    /// The hardware watchdog refused to arm.
    Watchdog(WatchdogError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Watchdog(e) => write!(f, "watchdog: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed, or a required
    /// field (alarm code, zone list) is absent.
    Malformed,
    /// The zone list is empty.
    NoZones,
    /// More zones than the controller has task slots for.
    TooManyZones,
    /// A field failed range validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "configuration malformed"),
            Self::NoZones => write!(f, "no zones configured"),
            Self::TooManyZones => write!(f, "too many zones configured"),
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Malformed operator input on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Nothing but whitespace was delivered.
    EmptyCode,
    /// The code contained a character that is not an ASCII digit.
    NonNumeral,
    /// The payload does not fit the inbound buffer.
    CodeTooLong,
    /// Payload on a channel the controller does not serve, or a request
    /// it does not understand.
    UnknownRequest,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "empty code"),
            Self::NonNumeral => write!(f, "code contains non-numeral characters"),
            Self::CodeTooLong => write!(f, "code too long"),
            Self::UnknownRequest => write!(f, "unknown request"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<WatchdogError> for Error {
    fn from(e: WatchdogError) -> Self {
        Self::Watchdog(e)
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
