//! Per-zone sensor sampling and change detection.
//!
//! Each zone is a pull-up digital input: a closed contact pulls the line
//! low, an open door or window lets it float high.
//!
//! ```text
//!   tick N:   sample() ─▶ check() ─▶ ZoneReport
//!                              │
//!                              └─ previous_state := sensor_state
//! ```
//!
//! The first `check()` after boot never reports a change. It emits exactly
//! one `ZoneInitial` event instead, whatever the sampled level.

use core::fmt;

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::ZoneConfig;
use crate::error::SensorError;

/// Contact state of a zone input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorState {
    #[default]
    Closed,
    Open,
}

impl SensorState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Value mirrored on the zone's own topic (`1` = open).
    pub fn as_value(self) -> u8 {
        u8::from(self.is_open())
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
        }
    }
}

/// Outcome of one `check()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneReport {
    /// First check after boot.
    Initial(SensorState),
    Changed { from: SensorState, to: SensorState },
    Unchanged,
}

/// Read-only view of a zone used by the arming precondition.
pub trait ZoneStatus {
    fn name(&self) -> &str;
    fn channel(&self) -> &str;
    fn is_open(&self) -> bool;
}

pub struct ZoneMonitor<P: InputPin> {
    id: u8,
    name: String,
    channel: String,
    pin: P,
    sensor_state: SensorState,
    previous_state: SensorState,
    state_changed: bool,
    reported_initial: bool,
}

impl<P: InputPin> ZoneMonitor<P> {
    pub fn new(config: &ZoneConfig, pin: P) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            channel: config.channel.clone(),
            pin,
            sensor_state: SensorState::Closed,
            previous_state: SensorState::Closed,
            state_changed: false,
            reported_initial: false,
        }
    }

    /// Read the input into `sensor_state`. A failed read keeps the last value.
    pub fn sample(&mut self) {
        match self.pin.is_high() {
            Ok(true) => self.sensor_state = SensorState::Open,
            Ok(false) => self.sensor_state = SensorState::Closed,
            Err(_) => warn!(
                "Zone: {} {}, keeping {}",
                self.name,
                SensorError::GpioReadFailed,
                self.sensor_state
            ),
        }
    }

    /// Compare the last sample with the previous tick and report.
    pub fn check(&mut self, sink: &mut impl EventSink) -> ZoneReport {
        let from = self.previous_state;
        let to = self.sensor_state;
        self.state_changed = to != from && self.reported_initial;

        let report = if !self.reported_initial {
            sink.emit(&AppEvent::ZoneInitial {
                name: self.name.clone(),
                channel: self.channel.clone(),
                state: to,
            });
            self.reported_initial = true;
            ZoneReport::Initial(to)
        } else if self.state_changed {
            sink.emit(&AppEvent::ZoneChanged {
                name: self.name.clone(),
                channel: self.channel.clone(),
                from,
                to,
            });
            ZoneReport::Changed { from, to }
        } else {
            ZoneReport::Unchanged
        };

        self.previous_state = to;
        report
    }

    /// One tick of the zone task.
    pub fn poll(&mut self, sink: &mut impl EventSink) -> ZoneReport {
        self.sample();
        self.check(sink)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn sensor_state(&self) -> SensorState {
        self.sensor_state
    }

    pub fn state_changed(&self) -> bool {
        self.state_changed
    }

    pub fn reported_initial(&self) -> bool {
        self.reported_initial
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}

impl<P: InputPin> ZoneStatus for ZoneMonitor<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn is_open(&self) -> bool {
        self.sensor_state.is_open()
    }
}
