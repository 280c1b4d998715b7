//! Local panic and silence keys.
//!
//! Active-low momentary switches on pull-up inputs. Each key is polled once
//! per tick and reports the press edge (released → pressed) only, so holding
//! a key down yields one action. The poll interval is the debounce.

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use crate::app::ports::KeyPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKey {
    /// Sound the steady siren.
    Panic,
    /// Silence a sounding siren.
    Silence,
}

/// Edge detector for one key.
pub struct KeyInput<P: InputPin> {
    key: LocalKey,
    pin: P,
    was_pressed: bool,
}

impl<P: InputPin> KeyInput<P> {
    pub fn new(key: LocalKey, pin: P) -> Self {
        Self {
            key,
            pin,
            was_pressed: false,
        }
    }

    /// Returns the key on the tick it goes down.
    pub fn poll(&mut self) -> Option<LocalKey> {
        let pressed = match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Keys: {:?} read failed", self.key);
                return None;
            }
        };
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if edge {
            debug!("Keys: {:?} pressed", self.key);
            Some(self.key)
        } else {
            None
        }
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}

/// The key pair as wired on the board. Either key may be absent.
pub struct LocalKeys<P: InputPin> {
    panic: Option<KeyInput<P>>,
    silence: Option<KeyInput<P>>,
}

impl<P: InputPin> LocalKeys<P> {
    pub fn new(panic: Option<P>, silence: Option<P>) -> Self {
        Self {
            panic: panic.map(|p| KeyInput::new(LocalKey::Panic, p)),
            silence: silence.map(|p| KeyInput::new(LocalKey::Silence, p)),
        }
    }
}

impl<P: InputPin> KeyPort for LocalKeys<P> {
    fn poll(&mut self) -> heapless::Vec<LocalKey, 2> {
        let mut pressed = heapless::Vec::new();
        for input in [self.panic.as_mut(), self.silence.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Some(key) = input.poll() {
                // Two slots for two keys.
                let _ = pressed.push(key);
            }
        }
        pressed
    }
}

/// Board without local keys.
#[derive(Debug, Default)]
pub struct NoKeys;

impl KeyPort for NoKeys {
    fn poll(&mut self) -> heapless::Vec<LocalKey, 2> {
        heapless::Vec::new()
    }
}
