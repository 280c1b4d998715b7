//! Serial console command channel.
//!
//! A reader thread blocks on console lines and forwards parsed deliveries
//! through a bounded `embassy-sync` channel; the CommandIntake task drains
//! it without blocking.
//!
//! ```text
//! ┌────────────────┐   Inbound    ┌────────────────────┐
//! │ console reader │────────────▶│ ConsoleCommands     │
//! │ (thread, Pro)  │  depth 4     │ (CommandIntake)     │
//! └────────────────┘              └────────────────────┘
//! ```
//!
//! Line syntax:
//!
//! | Line            | Delivery                         |
//! |-----------------|----------------------------------|
//! | `code 12345`    | alarm-management, payload `12345`|
//! | `status zones`  | output, payload `zones`          |

use std::io::{self, BufRead};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::commands::{Inbound, InboundChannel};
use crate::app::ports::CommandPort;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::ProtocolError;

/// Deliveries buffered between the reader and the controller.
const CONSOLE_DEPTH: usize = 4;

pub type ConsoleChannel = Channel<CriticalSectionRawMutex, Inbound, CONSOLE_DEPTH>;

/// Console reader → CommandIntake.
pub static CONSOLE_CHANNEL: ConsoleChannel = Channel::new();

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_console_line(line: &str) -> Result<Option<Inbound>, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let channel = match verb.to_ascii_lowercase().as_str() {
        "code" => InboundChannel::AlarmManagement,
        "status" => InboundChannel::Output,
        _ => return Err(ProtocolError::UnknownRequest),
    };
    Inbound::new(channel, rest.trim()).map(Some)
}

/// Forward every line of `reader` into `channel` until EOF.
///
/// A full channel drops the line; the operator retypes it.
pub fn pump_lines(reader: impl BufRead, channel: &ConsoleChannel) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Console: read failed ({})", e);
                continue;
            }
        };
        match parse_console_line(&line) {
            Ok(Some(inbound)) => {
                if channel.try_send(inbound).is_err() {
                    warn!("Console: controller busy, line dropped");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Console: {} (use `code <digits>` or `status <what>`)", e),
        }
    }
    debug!("Console: input closed");
}

/// Start the console reader on the protocol core.
pub fn spawn_reader() -> io::Result<JoinHandle<()>> {
    let handle = spawn_on_core(Core::Pro, 5, 4, "console\0", || {
        pump_lines(io::stdin().lock(), &CONSOLE_CHANNEL);
    })?;
    info!("Console: reader started");
    Ok(handle)
}

/// [`CommandPort`] over a console channel.
pub struct ConsoleCommands {
    channel: &'static ConsoleChannel,
}

impl ConsoleCommands {
    pub fn new(channel: &'static ConsoleChannel) -> Self {
        Self { channel }
    }
}

impl CommandPort for ConsoleCommands {
    fn poll(&mut self) -> Option<Inbound> {
        self.channel.try_receive().ok()
    }
}

/// Command port with nothing attached.
pub struct NoCommands;

impl CommandPort for NoCommands {
    fn poll(&mut self) -> Option<Inbound> {
        None
    }
}
