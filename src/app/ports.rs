//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (storage, event sinks, telemetry, command channels, the
//! watchdog) implement these traits. Zone inputs and siren outputs use the
//! `embedded-hal` digital traits directly. The domain core never touches
//! hardware or the network.

use super::commands::Inbound;
use super::events::{AppEvent, Severity};
use crate::drivers::keys::LocalKey;
use crate::scheduler::TaskId;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the arming records.
///
/// Write operations MUST be atomic. No partial writes on power loss.
/// The ESP-IDF NVS API guarantees this per `nvs_commit()`; the in-memory
/// simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically, replacing any previous value.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port. Adapters
/// decide where they go (serial log, pub/sub topics, both).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Outbound publish capability of the pub/sub client.
///
/// Delivery is best-effort: callers log failures and carry on.
pub trait TelemetryPort {
    fn publish(&mut self, topic: &str, message: &str, severity: Severity)
    -> Result<(), TelemetryError>;
}

// ───────────────────────────────────────────────────────────────
// Inbound ports (driving adapters: outside world → domain)
// ───────────────────────────────────────────────────────────────

/// Remote command channel (pub/sub subscription, serial console, keypad).
///
/// `poll` MUST NOT block: it is called from the command-intake task once
/// per tick and returns at most one pending delivery.
pub trait CommandPort {
    fn poll(&mut self) -> Option<Inbound>;
}

/// Local panic / silence buttons.
pub trait KeyPort {
    /// Keys whose press edge was seen since the previous poll.
    fn poll(&mut self) -> heapless::Vec<LocalKey, 2>;
}

// ───────────────────────────────────────────────────────────────
// Liveness
// ───────────────────────────────────────────────────────────────

/// Hardware watchdog facility.
///
/// Once armed, the device resets unless [`feed`](Self::feed) is called
/// within the timeout. The reset is outside the controller's control.
pub trait WatchdogPort {
    fn arm(&mut self, timeout_ms: u32) -> Result<(), WatchdogError>;
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Scheduler seam
// ───────────────────────────────────────────────────────────────

/// Callback the [`Scheduler`](crate::scheduler::Scheduler) invokes for
/// each task slot, in fixed order, once per tick.
///
/// Implementations run one bounded step of the task and return.
pub trait TaskRunner {
    fn run(&mut self, task: TaskId);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations and record decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error, including an unmounted or missing medium.
    IoError,
    /// Stored record failed to decode.
    Corrupted,
}

/// Errors from [`TelemetryPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// The client is not connected to the broker.
    Disconnected,
    /// The client accepted the message but the send failed.
    SendFailed,
}

/// Errors from [`WatchdogPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogError {
    /// The hardware timer rejected the configuration.
    ConfigRejected(i32),
    /// The current task could not be subscribed.
    SubscribeFailed(i32),
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "record corrupted"),
        }
    }
}

impl core::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "not connected"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

impl core::fmt::Display for WatchdogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConfigRejected(rc) => write!(f, "watchdog config rejected (rc={})", rc),
            Self::SubscribeFailed(rc) => write!(f, "watchdog subscribe failed (rc={})", rc),
        }
    }
}
