//! Cooperative round-robin scheduler.
//!
//! Every tick runs each perpetual task once, in the order fixed at
//! construction, through the [`TaskRunner`] port:
//!
//! ```text
//!  ┌──────────── tick N (one thread) ─────────────────────────────┐
//!  │ Zone(0) · Zone(1) · … · Zone(n-1)                            │
//!  │   → CommandIntake → LocalInput → SirenDismiss → Heartbeat    │
//!  └──────────────────────────────────────────────────────────────┘
//!        │ sleep for the rest of the interval
//!        ▼
//!     tick N+1
//! ```
//!
//! Tasks run to completion and return; a mutation made by one task is
//! visible to every later task in the same tick. There is no cancellation.
//! A task that never returns starves the Heartbeat, and the hardware
//! watchdog resets the chip.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::TaskRunner;
use crate::config::MAX_ZONES;
use crate::error::ConfigError;

/// Identifies one perpetual task slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Sample and report the zone at this index.
    Zone(usize),
    /// Drain one inbound command.
    CommandIntake,
    /// Poll the panic and silence keys.
    LocalInput,
    /// Advance the siren auto-dismiss timer.
    SirenDismiss,
    /// Feed the watchdog when due.
    Heartbeat,
}

/// Zone slots plus the four fixed tasks.
pub const MAX_TASKS: usize = MAX_ZONES + 4;

pub struct Scheduler {
    tasks: heapless::Vec<TaskId, MAX_TASKS>,
    tick_count: u64,
}

impl Scheduler {
    /// Build the task table for `zone_count` zones.
    pub fn new(zone_count: usize) -> Result<Self, ConfigError> {
        if zone_count > MAX_ZONES {
            return Err(ConfigError::TooManyZones);
        }
        let mut tasks = heapless::Vec::new();
        let fixed = [
            TaskId::CommandIntake,
            TaskId::LocalInput,
            TaskId::SirenDismiss,
            TaskId::Heartbeat,
        ];
        for task in (0..zone_count).map(TaskId::Zone).chain(fixed) {
            tasks.push(task).map_err(|_| ConfigError::TooManyZones)?;
        }
        Ok(Self {
            tasks,
            tick_count: 0,
        })
    }

    /// Run every task once, in order.
    pub fn tick(&mut self, runner: &mut impl TaskRunner) {
        for &task in &self.tasks {
            runner.run(task);
        }
        self.tick_count += 1;
    }

    /// Tick forever at `interval`. Overruns are logged and the next tick
    /// starts immediately.
    pub fn run(&mut self, runner: &mut impl TaskRunner, interval: Duration) -> ! {
        debug!(
            "Scheduler: {} tasks every {} ms",
            self.tasks.len(),
            interval.as_millis()
        );
        loop {
            let started = Instant::now();
            self.tick(runner);
            let elapsed = started.elapsed();
            match interval.checked_sub(elapsed) {
                Some(rest) => std::thread::sleep(rest),
                None => warn!(
                    "Scheduler: tick {} overran ({} ms > {} ms)",
                    self.tick_count,
                    elapsed.as_millis(),
                    interval.as_millis()
                ),
            }
        }
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
