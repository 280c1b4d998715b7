//! Pin drivers, hardware initialisation, and runtime helpers.

pub mod hw_init;
pub mod keys;
pub mod siren;
pub mod task_pin;
pub mod watchdog;
