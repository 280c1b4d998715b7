//! Task runner: maps scheduler slots onto service operations.
//!
//! [`ControllerTasks`] borrows the service, the outbound sink and every
//! inbound port for the lifetime of the scheduler loop. Each slot runs one
//! bounded step and returns.

use embedded_hal::digital::{InputPin, OutputPin};

use super::ports::{CommandPort, EventSink, KeyPort, StoragePort, TaskRunner, WatchdogPort};
use super::service::AppService;
use crate::drivers::watchdog::WatchdogSupervisor;
use crate::scheduler::TaskId;

pub struct ControllerTasks<'a, Z, O, S, E, W>
where
    Z: InputPin,
    O: OutputPin,
    S: StoragePort,
    E: EventSink,
    W: WatchdogPort,
{
    app: &'a mut AppService<Z, O, S>,
    sink: &'a mut E,
    commands: &'a mut dyn CommandPort,
    keys: &'a mut dyn KeyPort,
    watchdog: &'a mut WatchdogSupervisor<W>,
}

impl<'a, Z, O, S, E, W> ControllerTasks<'a, Z, O, S, E, W>
where
    Z: InputPin,
    O: OutputPin,
    S: StoragePort,
    E: EventSink,
    W: WatchdogPort,
{
    pub fn new(
        app: &'a mut AppService<Z, O, S>,
        sink: &'a mut E,
        commands: &'a mut dyn CommandPort,
        keys: &'a mut dyn KeyPort,
        watchdog: &'a mut WatchdogSupervisor<W>,
    ) -> Self {
        Self {
            app,
            sink,
            commands,
            keys,
            watchdog,
        }
    }
}

impl<Z, O, S, E, W> TaskRunner for ControllerTasks<'_, Z, O, S, E, W>
where
    Z: InputPin,
    O: OutputPin,
    S: StoragePort,
    E: EventSink,
    W: WatchdogPort,
{
    fn run(&mut self, task: TaskId) {
        match task {
            TaskId::Zone(index) => self.app.run_zone(index, &mut *self.sink),
            // One delivery per tick keeps the slot bounded.
            TaskId::CommandIntake => {
                if let Some(inbound) = self.commands.poll() {
                    self.app.handle_inbound(&inbound, &mut *self.sink);
                }
            }
            TaskId::LocalInput => {
                for key in self.keys.poll() {
                    self.app.handle_key(key, &mut *self.sink);
                }
            }
            TaskId::SirenDismiss => self.app.dismiss_tick(&mut *self.sink),
            TaskId::Heartbeat => self.watchdog.heartbeat(),
        }
    }
}
