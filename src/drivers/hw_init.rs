//! One-shot GPIO configuration and the `embedded-hal` pin wrappers.
//!
//! Zone and key inputs are configured with the internal pull-up; siren
//! outputs are configured push-pull and parked high (inactive, the siren
//! relays are active-low). Called once from `main()` before the scheduler
//! starts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the wrappers call `gpio_get_level` / `gpio_set_level`. On the
//! host they read and write a table of simulated line levels, which tests
//! drive through [`sim_set_level`] and inspect through [`sim_level`].

use core::fmt;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::info;

use crate::config::SystemConfig;

/// Highest GPIO number on the ESP32 family plus one.
pub const GPIO_COUNT: usize = 49;

// ── Error types ───────────────────────────────────────────────

/// Errors during one-shot pin configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    InvalidPin(i32),
    GpioConfigFailed(i32),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "GPIO{} out of range", pin),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Runtime pin access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    InvalidPin(i32),
    SetLevelFailed(i32),
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "GPIO{} out of range", pin),
            Self::SetLevelFailed(rc) => write!(f, "gpio_set_level failed (rc={})", rc),
        }
    }
}

fn check_pin(pin: i32) -> Result<usize, GpioError> {
    usize::try_from(pin)
        .ok()
        .filter(|&p| p < GPIO_COUNT)
        .ok_or(GpioError::InvalidPin(pin))
}

// ── Configuration ─────────────────────────────────────────────

/// Configure every pin named in `config`.
pub fn init_pins(config: &SystemConfig) -> Result<(), HwInitError> {
    let inputs = config
        .zones
        .iter()
        .map(|z| z.gpio)
        .chain(config.panic_key_gpio)
        .chain(config.silence_key_gpio);

    for pin in inputs {
        configure(pin, Direction::PullUpInput)?;
    }
    for pin in [config.siren_steady_gpio, config.siren_yelp_gpio] {
        configure(pin, Direction::Output)?;
        // Park inactive before anything can drive it.
        write_level(pin, true).map_err(|_| HwInitError::InvalidPin(pin))?;
    }

    info!(
        "hw_init: {} zone inputs, siren outputs GPIO{}/GPIO{}",
        config.zones.len(),
        config.siren_steady_gpio,
        config.siren_yelp_gpio
    );
    Ok(())
}

#[derive(Clone, Copy)]
enum Direction {
    PullUpInput,
    Output,
}

#[cfg(target_os = "espidf")]
fn configure(pin: i32, direction: Direction) -> Result<(), HwInitError> {
    check_pin(pin).map_err(|_| HwInitError::InvalidPin(pin))?;
    let (mode, pull_up) = match direction {
        Direction::PullUpInput => (
            gpio_mode_t_GPIO_MODE_INPUT,
            gpio_pullup_t_GPIO_PULLUP_ENABLE,
        ),
        Direction::Output => (
            gpio_mode_t_GPIO_MODE_OUTPUT,
            gpio_pullup_t_GPIO_PULLUP_DISABLE,
        ),
    };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: pull_up,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: called once from main() before the scheduler starts; the
    // pin number was range-checked above.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn configure(pin: i32, _direction: Direction) -> Result<(), HwInitError> {
    check_pin(pin).map_err(|_| HwInitError::InvalidPin(pin))?;
    Ok(())
}

// ── Line access ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn read_level(pin: i32) -> Result<bool, GpioError> {
    check_pin(pin)?;
    // SAFETY: read-only register access on a configured input pin.
    Ok((unsafe { gpio_get_level(pin) }) != 0)
}

#[cfg(target_os = "espidf")]
fn write_level(pin: i32, high: bool) -> Result<(), GpioError> {
    check_pin(pin)?;
    // SAFETY: writes an already-configured output pin from the scheduler
    // thread only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(GpioError::SetLevelFailed(ret));
    }
    Ok(())
}

/// Simulated line levels; every line idles high like a pulled-up input.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [AtomicBool; GPIO_COUNT] = [const { AtomicBool::new(true) }; GPIO_COUNT];

#[cfg(not(target_os = "espidf"))]
fn read_level(pin: i32) -> Result<bool, GpioError> {
    let idx = check_pin(pin)?;
    Ok(SIM_LEVELS[idx].load(Ordering::Relaxed))
}

#[cfg(not(target_os = "espidf"))]
fn write_level(pin: i32, high: bool) -> Result<(), GpioError> {
    let idx = check_pin(pin)?;
    SIM_LEVELS[idx].store(high, Ordering::Relaxed);
    Ok(())
}

/// Drive a simulated line (open a zone, press a key).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    let _ = write_level(pin, high);
}

/// Current simulated line level. Out-of-range pins read high.
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(pin: i32) -> bool {
    read_level(pin).unwrap_or(true)
}

// ── embedded-hal wrappers ─────────────────────────────────────

/// A configured input line.
#[derive(Debug)]
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn gpio(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        read_level(self.pin)
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        read_level(self.pin).map(|high| !high)
    }
}

/// A configured output line.
#[derive(Debug)]
pub struct GpioOutput {
    pin: i32,
}

impl GpioOutput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn gpio(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        write_level(self.pin, false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        write_level(self.pin, true)
    }
}
