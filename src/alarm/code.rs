//! Operator code parser.
//!
//! ```text
//!   "1234"   → numeral 1234, no exclusions
//!   "123"    → numeral 123 (inputs of ≤ 3 digits compare whole)
//!   "123457" → numeral 1234, exclusions [zone-5, zone-7]
//! ```
//!
//! Every digit after the fourth names one zone to exclude. A digit named
//! twice yields one exclusion, so the list never outgrows the ten decimal
//! digits however long the input is.

use super::state::{MAX_EXCLUSIONS, ZoneId, zone_id_for};
use crate::error::ProtocolError;

/// Number of leading digits compared against the configured code.
pub const COMPARE_LEN: usize = 4;

/// Structured result of parsing one operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCode {
    /// Value compared against the configured code.
    pub numeral: u32,
    /// Zones named by the trailing digits, first mention order, no repeats.
    pub exclusions: heapless::Vec<ZoneId, MAX_EXCLUSIONS>,
}

/// Parse a raw operator input. Surrounding whitespace is ignored.
pub fn parse_code(raw: &str) -> Result<ParsedCode, ProtocolError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ProtocolError::EmptyCode);
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::NonNumeral);
    }

    let split = input.len().min(COMPARE_LEN);
    let (head, tail) = input.split_at(split);

    // At most four ASCII digits: always fits a u32.
    let numeral = head
        .bytes()
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

    let mut exclusions: heapless::Vec<ZoneId, MAX_EXCLUSIONS> = heapless::Vec::new();
    for digit in tail.chars() {
        let id = zone_id_for(digit);
        if !exclusions.contains(&id) {
            // At most ten distinct digits.
            let _ = exclusions.push(id);
        }
    }

    Ok(ParsedCode {
        numeral,
        exclusions,
    })
}
