//! Application core: alarm semantics behind port traits.
//!
//! Everything in here runs on the host unchanged: pins arrive as
//! `embedded-hal` traits and every other interaction goes through the
//! traits in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod tasks;
