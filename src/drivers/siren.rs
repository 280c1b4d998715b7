//! Siren driver: two active-low relay outputs and the auto-dismiss timer.
//!
//! ```text
//!            trigger(m)              trigger(m') (m' ≠ m)
//!   Idle ───────────────▶ Sounding(m) ─────────────▶ Sounding(m')
//!    ▲                        │
//!    └──── disable(reason) ───┘   (operator, disarm, timeout)
//! ```
//!
//! At most one output is active at any time: a mode switch releases the old
//! relay before the new one is driven. Pin write failures are logged and
//! the state machine carries on.

use core::fmt;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenMode {
    Steady,
    Yelp,
}

impl fmt::Display for SirenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steady => write!(f, "steady"),
            Self::Yelp => write!(f, "yelp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SirenState {
    #[default]
    Idle,
    Sounding(SirenMode),
}

/// Why a sounding siren was silenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceReason {
    /// Local silence key.
    Operator,
    /// The system was disarmed.
    Disarm,
    /// The dismiss timer expired.
    Timeout,
}

impl fmt::Display for SilenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Disarm => write!(f, "disarm"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Ticks the siren has been sounding without a silence action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissTimer {
    elapsed: u32,
    timeout: u32,
}

impl DismissTimer {
    pub fn new(timeout_ticks: u32) -> Self {
        Self {
            elapsed: 0,
            timeout: timeout_ticks,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }
}

pub struct SirenDriver<O: OutputPin> {
    steady: O,
    yelp: O,
    state: SirenState,
    timer: DismissTimer,
}

impl<O: OutputPin> SirenDriver<O> {
    /// Take both outputs and drive them inactive.
    pub fn new(steady: O, yelp: O, timeout_ticks: u32) -> Self {
        let mut siren = Self {
            steady,
            yelp,
            state: SirenState::Idle,
            timer: DismissTimer::new(timeout_ticks),
        };
        siren.release(SirenMode::Steady);
        siren.release(SirenMode::Yelp);
        siren
    }

    /// Sound `mode`. Returns `false` if it was already sounding in `mode`.
    pub fn trigger(&mut self, mode: SirenMode, sink: &mut impl EventSink) -> bool {
        match self.state {
            SirenState::Sounding(current) if current == mode => return false,
            SirenState::Sounding(current) => self.release(current),
            SirenState::Idle => {}
        }

        self.drive(mode);
        self.state = SirenState::Sounding(mode);
        self.timer.reset();
        info!("Siren: {} triggered", mode);
        sink.emit(&AppEvent::SirenTriggered(mode));
        true
    }

    /// Silence the siren. Returns `false` if it was already idle.
    pub fn disable(&mut self, reason: SilenceReason, sink: &mut impl EventSink) -> bool {
        let SirenState::Sounding(mode) = self.state else {
            return false;
        };

        self.release(mode);
        self.state = SirenState::Idle;
        self.timer.reset();
        info!("Siren: {} disabled ({})", mode, reason);
        sink.emit(&AppEvent::SirenSilenced { mode, reason });
        true
    }

    /// Advance the dismiss timer by one tick. Returns `true` on the tick
    /// that silenced the siren.
    pub fn tick_dismiss(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.is_sounding() {
            return false;
        }
        if self.timer.elapsed >= self.timer.timeout {
            return self.disable(SilenceReason::Timeout, sink);
        }
        self.timer.elapsed += 1;
        false
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, SirenState::Sounding(_))
    }

    pub fn state(&self) -> SirenState {
        self.state
    }

    pub fn timer(&self) -> DismissTimer {
        self.timer
    }

    // ── Output lines (active-low) ─────────────────────────────

    fn output(&mut self, mode: SirenMode) -> &mut O {
        match mode {
            SirenMode::Steady => &mut self.steady,
            SirenMode::Yelp => &mut self.yelp,
        }
    }

    fn drive(&mut self, mode: SirenMode) {
        if self.output(mode).set_low().is_err() {
            warn!("Siren: {} driving {} output", ActuatorError::GpioWriteFailed, mode);
        }
    }

    fn release(&mut self, mode: SirenMode) {
        if self.output(mode).set_high().is_err() {
            warn!("Siren: {} releasing {} output", ActuatorError::GpioWriteFailed, mode);
        }
    }
}
