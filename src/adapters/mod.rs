//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                      |
//! |------------|---------------|----------------------------------|
//! | `console`  | CommandPort   | UART console via reader thread   |
//! | `log_sink` | EventSink     | Serial log output                |
//! | `nvs`      | StoragePort   | NVS / in-memory store            |
//! | `publish`  | EventSink     | TelemetryPort topics             |
//! |            | TelemetryPort | Log output (`LogTelemetry`)      |

pub mod console;
pub mod log_sink;
pub mod nvs;
pub mod publish;
