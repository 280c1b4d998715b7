//! Mock pins and ports for integration tests.
//!
//! Pins share their level through an `Rc<Cell<bool>>`, so a test keeps a
//! handle to every line it hands to the controller. Storage is a shared map
//! that outlives a simulated restart.

use core::convert::Infallible;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use zonewatch::app::commands::{Inbound, InboundChannel};
use zonewatch::app::events::AppEvent;
use zonewatch::app::ports::{
    CommandPort, EventSink, KeyPort, StorageError, StoragePort, WatchdogError, WatchdogPort,
};
use zonewatch::config::{SystemConfig, ZoneConfig};
use zonewatch::drivers::keys::LocalKey;

// ── Pins ──────────────────────────────────────────────────────

/// One digital line. Starts low: a closed zone, an active siren output.
#[derive(Clone, Default)]
pub struct MockPin(Rc<Cell<bool>>);

#[allow(dead_code)]
impl MockPin {
    pub fn set_high(&self, high: bool) {
        self.0.set(high);
    }

    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

// ── Storage ───────────────────────────────────────────────────

/// Shared in-memory medium. Clones see the same contents.
#[derive(Clone, Default)]
pub struct MemStorage {
    map: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    pub offline: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MemStorage {
    pub fn corrupt(&self, namespace: &str, key: &str) {
        self.map
            .borrow_mut()
            .insert(format!("{namespace}::{key}"), vec![0xFF; 4]);
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    pub fn exists_record(&self, namespace: &str, key: &str) -> bool {
        self.exists(namespace, key)
    }
}

impl StoragePort for MemStorage {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.offline.get() {
            return Err(StorageError::IoError);
        }
        match self.map.borrow().get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.offline.get() {
            return Err(StorageError::IoError);
        }
        self.map
            .borrow_mut()
            .insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.map.borrow().contains_key(&format!("{ns}::{key}"))
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Inbound ports ─────────────────────────────────────────────

#[derive(Default)]
pub struct QueuedCommands(pub VecDeque<Inbound>);

#[allow(dead_code)]
impl QueuedCommands {
    pub fn code(&mut self, raw: &str) {
        self.push(InboundChannel::AlarmManagement, raw);
    }

    pub fn status(&mut self, what: &str) {
        self.push(InboundChannel::Output, what);
    }

    fn push(&mut self, channel: InboundChannel, payload: &str) {
        let inbound = Inbound::new(channel, payload).expect("payload fits");
        self.0.push_back(inbound);
    }
}

impl CommandPort for QueuedCommands {
    fn poll(&mut self) -> Option<Inbound> {
        self.0.pop_front()
    }
}

#[derive(Default)]
pub struct ScriptedKeys(pub VecDeque<LocalKey>);

impl KeyPort for ScriptedKeys {
    fn poll(&mut self) -> heapless::Vec<LocalKey, 2> {
        let mut out = heapless::Vec::new();
        if let Some(key) = self.0.pop_front() {
            let _ = out.push(key);
        }
        out
    }
}

// ── Watchdog ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockWatchdog {
    pub armed_ms: Option<u32>,
    pub feeds: u32,
    pub reject: bool,
}

impl WatchdogPort for MockWatchdog {
    fn arm(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        if self.reject {
            return Err(WatchdogError::ConfigRejected(-1));
        }
        self.armed_ms = Some(timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }
}

// ── Configuration ─────────────────────────────────────────────

/// Code 1234 with `count` zones named "Zone N" on `monitoring.zone-N`.
pub fn test_config(count: u8) -> SystemConfig {
    let zones = (1..=count)
        .map(|i| ZoneConfig {
            id: i,
            name: format!("Zone {i}"),
            channel: format!("monitoring.zone-{i}"),
            gpio: i32::from(i) + 3,
        })
        .collect();
    SystemConfig::new(1234, zones)
}
