// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use lazy_static::lazy_static;
use regex::Regex;

use super::SignalType;

lazy_static! {
    // letter, digits, underscore, digits, optional trailing direction letter
    static ref BLOCK_SIGNAL_REGEX: Regex = Regex::new(r"^[A-Za-z]\d+_\d+[A-Za-z]?$").unwrap();
    static ref DIRECTIONAL_SIGNAL_REGEX: Regex = Regex::new(r"^[A-Za-z]\d+_\d+[A-Z]$").unwrap();
}

/// Enforced speeds that only main signals show.
pub const MAIN_SIGNAL_SPEEDS: [i32; 2] = [60, 100];

pub fn is_block_signal(signal_id: &str) -> bool {
    BLOCK_SIGNAL_REGEX.is_match(signal_id)
}

/// Stricter block shape carrying an uppercase direction letter, e.g. `L1_2A`.
pub fn is_directional(signal_id: &str) -> bool {
    DIRECTIONAL_SIGNAL_REGEX.is_match(signal_id)
}

/// `L1_2@foo` -> (`L1_2`, `foo`)
pub fn split_signal_field(raw: &str) -> (&str, &str) {
    match raw.split_once('@') {
        Some((signal_id, extra)) => (signal_id, extra),
        None => (raw, ""),
    }
}

pub fn classify(speed: Option<i32>, signal_id: &str) -> Option<SignalType> {
    if speed.is_some_and(|speed| MAIN_SIGNAL_SPEEDS.contains(&speed)) {
        return Some(SignalType::Main);
    }

    if is_block_signal(signal_id) {
        return Some(SignalType::Block);
    }

    None
}
