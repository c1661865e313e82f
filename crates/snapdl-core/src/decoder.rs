//! Reverses the resolver's obfuscated payload.
//!
//! The resolver ships its HTML as a call `("<h>",<u>,"<n>",<t>,<e>,<r>)`: `h` is a
//! stream of runs separated by the terminator `n[e]`, each run spelling a
//! base-`e` number through the symbol positions of `n`, and each number is a
//! code point shifted up by `t`. The alphabet changes per request, so the
//! inverse is parameterized instead of table-driven.

use crate::error::DecodeError;
use crate::numeral;

/// Parameters captured from the payload's embedded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTuple {
    /// Encoded body (`h`).
    pub encoded: String,
    /// Second field (`u`), kept as its digits. Not used by the decoder.
    pub reserved: String,
    /// Alphabet (`n`), used for symbol lookup and for the terminator.
    pub alphabet: String,
    /// Code point shift (`t`).
    pub offset: u32,
    /// Numeral base of each run (`e`); also the terminator's index in `alphabet`.
    pub base: u32,
    /// Trailing field (`r`), kept as its digits. Not used by the decoder.
    pub trailing: String,
}

impl ControlTuple {
    /// Decodes `encoded` with the tuple's own alphabet on both sides.
    pub fn decode(&self) -> Result<String, DecodeError> {
        decode(
            &self.alphabet,
            &self.alphabet,
            self.offset,
            self.base,
            &self.encoded,
        )
    }
}

/// Decodes `payload`.
///
/// `index_alphabet[base]` terminates each run. Every character of a run is
/// replaced by the decimal string of its position in `cipher_alphabet`; the
/// concatenated digits are read in `base`, and `value - offset` is emitted as
/// one character. A final run without terminator is decoded as well.
pub fn decode(
    cipher_alphabet: &str,
    index_alphabet: &str,
    offset: u32,
    base: u32,
    payload: &str,
) -> Result<String, DecodeError> {
    let terminator = index_alphabet
        .chars()
        .nth(base as usize)
        .ok_or(DecodeError::MissingTerminator {
            base,
            alphabet_len: index_alphabet.chars().count(),
        })?;
    let cipher: Vec<char> = cipher_alphabet.chars().collect();

    let mut out = String::new();
    let mut chars = payload.chars().peekable();
    while chars.peek().is_some() {
        let mut digits = String::new();
        for c in chars.by_ref() {
            if c == terminator {
                break;
            }
            let index = cipher
                .iter()
                .position(|&s| s == c)
                .ok_or(DecodeError::UnknownSymbol(c))?;
            digits.push_str(&index.to_string());
        }
        out.push(run_char(&digits, base, offset)?);
    }
    Ok(out)
}

fn run_char(digits: &str, base: u32, offset: u32) -> Result<char, DecodeError> {
    let decimal = numeral::recode(digits, base, 10)?;
    // Saturated values do not fit and are rejected below.
    let value: i128 = decimal.parse().unwrap_or(i128::MAX);
    let code = value - offset as i128;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or(DecodeError::InvalidCodePoint(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `decode` for a tuple-shaped payload, used to build fixtures.
    fn obfuscate(text: &str, alphabet: &str, offset: u32, base: u32) -> String {
        let symbols: Vec<char> = alphabet.chars().collect();
        let terminator = symbols[base as usize];
        let mut out = String::new();
        for c in text.chars() {
            let decimal = (c as u32 + offset).to_string();
            let digits = numeral::recode(&decimal, 10, base).unwrap();
            for d in digits.chars() {
                out.push(symbols[d.to_digit(10).unwrap() as usize]);
            }
            out.push(terminator);
        }
        out
    }

    #[test]
    fn synthetic_fixture_arithmetic() {
        // terminator "xy"[1] = 'y'; run "aa" -> digits "00" -> value 0 -> chr(0 - 0)
        assert_eq!(decode("ab", "xy", 0, 1, "aay").unwrap(), "\u{0}");
        // same chain read in base 2
        assert_eq!(decode("ab", "xyz", 0, 2, "aaz").unwrap(), "\u{0}");
    }

    #[test]
    fn terminator_is_consumed_and_trailing_run_decoded() {
        // base 2 over "ab": "ba" -> "10" -> 2, shifted by 0.
        assert_eq!(decode("ab", "abz", 0, 2, "bazbb").unwrap(), "\u{2}\u{3}");
    }

    #[test]
    fn offset_is_subtracted() {
        // "bab" -> "101" base 2 = 5; 5 - 5 = 0; "bbb" -> 7 - 5 = 2
        assert_eq!(decode("ab", "abz", 5, 2, "babzbbbz").unwrap(), "\u{0}\u{2}");
    }

    #[test]
    fn decodes_obfuscated_html() {
        let alphabet = "qwertyuioplk";
        let html = r#"<a href=\"https://d.snaptik.app/v.mp4\">"#;
        let payload = obfuscate(html, alphabet, 27, 8);
        assert_eq!(decode(alphabet, alphabet, 27, 8, &payload).unwrap(), html);
    }

    #[test]
    fn control_tuple_uses_own_alphabet() {
        let alphabet = "MnbvCxzLkj";
        let tuple = ControlTuple {
            encoded: obfuscate("ok", alphabet, 3, 6),
            reserved: "77".to_string(),
            alphabet: alphabet.to_string(),
            offset: 3,
            base: 6,
            trailing: "12".to_string(),
        };
        assert_eq!(tuple.decode().unwrap(), "ok");
    }

    #[test]
    fn decoding_is_deterministic() {
        let payload = obfuscate("same input", "zyxwvutsrq", 9, 5);
        let first = decode("zyxwvutsrq", "zyxwvutsrq", 9, 5, &payload).unwrap();
        for _ in 0..10 {
            assert_eq!(decode("zyxwvutsrq", "zyxwvutsrq", 9, 5, &payload).unwrap(), first);
        }
    }

    #[test]
    fn missing_terminator_position() {
        assert_eq!(
            decode("ab", "ab", 0, 2, "a"),
            Err(DecodeError::MissingTerminator {
                base: 2,
                alphabet_len: 2
            })
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert_eq!(
            decode("ab", "abz", 0, 2, "acz"),
            Err(DecodeError::UnknownSymbol('c'))
        );
    }

    #[test]
    fn negative_code_point_is_rejected() {
        assert_eq!(
            decode("ab", "abz", 4, 2, "bz"),
            Err(DecodeError::InvalidCodePoint(-3))
        );
    }

    #[test]
    fn empty_payload_decodes_to_empty_text() {
        assert_eq!(decode("ab", "abz", 0, 2, "").unwrap(), "");
    }
}
