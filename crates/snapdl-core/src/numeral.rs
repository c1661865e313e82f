//! Digit-string conversion between numeral bases 2..=64.
//!
//! The symbol set is `0-9a-zA-Z+/`, truncated to the requested base.
//! A source base of 1 is accepted and degenerates to the single symbol `0`
//! (every value reads as zero); a target base must be at least 2.

use crate::error::DecodeError;

const SYMBOLS: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 64;

fn alphabet(base: u32, min: u32) -> Result<&'static [u8], DecodeError> {
    if !(min..=MAX_BASE).contains(&base) {
        return Err(DecodeError::UnsupportedBase(base));
    }
    Ok(&SYMBOLS[..base as usize])
}

/// Interprets `digits` as a base-`base` integer.
///
/// Symbols outside the truncated alphabet contribute zero; they still occupy
/// a position, so they shift the weight of everything to their left.
fn digits_value(digits: &str, symbols: &[u8]) -> u128 {
    let base = symbols.len() as u128;
    let mut weight: u128 = 1;
    let mut value: u128 = 0;
    for b in digits.bytes().rev() {
        if let Some(d) = symbols.iter().position(|&s| s == b) {
            value = value.saturating_add((d as u128).saturating_mul(weight));
        }
        weight = weight.saturating_mul(base);
    }
    value
}

fn encode_value(mut value: u128, symbols: &[u8]) -> String {
    if value == 0 {
        return (symbols[0] as char).to_string();
    }
    let base = symbols.len() as u128;
    let mut out = Vec::new();
    while value > 0 {
        out.push(symbols[(value % base) as usize]);
        value /= base;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Converts `digits` from `source_base` to `target_base`.
///
/// A zero value yields `"0"`, never an empty string.
pub fn recode(digits: &str, source_base: u32, target_base: u32) -> Result<String, DecodeError> {
    let source = alphabet(source_base, 1)?;
    let target = alphabet(target_base, MIN_BASE)?;
    Ok(encode_value(digits_value(digits, source), target))
}
