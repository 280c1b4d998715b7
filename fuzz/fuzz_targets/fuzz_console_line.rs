//! Fuzz target: console line syntax
//!
//! Every accepted line must map to a command or a typed error, never panic.
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use zonewatch::adapters::console::parse_console_line;
use zonewatch::app::commands::AppCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(Some(inbound)) = parse_console_line(line) {
        let _ = AppCommand::from_inbound(&inbound);
    }
});
