//! Fuzz target: operator code parser
//!
//! Feeds arbitrary UTF-8 to `parse_code` and checks:
//! - No panics
//! - A parsed numeral never exceeds four digits
//! - Exclusions are the distinct digits past the fourth
//!
//! cargo fuzz run fuzz_code_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use zonewatch::alarm::code::{COMPARE_LEN, parse_code};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(parsed) = parse_code(raw) {
        assert!(parsed.numeral <= 9999);
        let input = raw.trim();
        let tail = &input[input.len().min(COMPARE_LEN)..];
        let mut distinct: Vec<char> = tail.chars().collect();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(parsed.exclusions.len(), distinct.len());
    }
});
