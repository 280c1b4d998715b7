//! Default GPIO assignments for the Zonewatch controller board.
//!
//! The configuration document may override every pin; these values are the
//! fallbacks used when a field is omitted and by the host simulation.

// ---------------------------------------------------------------------------
// Siren relays (active-low: LOW = sounding)
// ---------------------------------------------------------------------------

/// Relay for the steady siren tone.
pub const SIREN_STEADY_GPIO: i32 = 25;
/// Relay for the yelp siren tone.
pub const SIREN_YELP_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Local keys (NeoKey-style momentary switches, pull-up, LOW = pressed)
// ---------------------------------------------------------------------------

/// Panic key: sounds the steady siren.
pub const PANIC_KEY_GPIO: i32 = 32;
/// Silence key: stops a sounding siren.
pub const SILENCE_KEY_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Zone inputs (pull-up, HIGH = open)
// ---------------------------------------------------------------------------

/// Zone contacts on the terminal block, in terminal order.
pub const ZONE_GPIOS: [i32; 8] = [4, 5, 13, 15, 16, 17, 18, 19];
