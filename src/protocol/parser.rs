//! Classification of framed protocol lines
//!
//! A line is classified by its first character; the payload is whatever
//! number can be found after the tag. Malformed payloads and unknown tags
//! yield `None` and are dropped by the caller - never an error.

use crate::types::Reading;

/// Parse one framed line into a typed reading
///
/// Pure function; returns `None` for empty lines, unknown tags, and tags
/// without an extractable value.
pub fn parse_line(line: &str) -> Option<Reading> {
    let mut chars = line.chars();
    let tag = chars.next()?;
    let payload = chars.as_str();

    match tag {
        'S' => first_digit_run(payload).map(Reading::Waveform),
        'B' => first_digit_run(payload).map(Reading::Bpm),
        'Q' => first_digit_run(payload).map(Reading::Ibi),
        'T' => first_decimal(payload).map(Reading::Temperature),
        _ => None,
    }
}

/// First maximal run of ASCII digits in `s`, parsed as an integer
fn first_digit_run(s: &str) -> Option<i32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let run = &s[start..];
    let end = run
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(run.len());
    run[..end].parse().ok()
}

/// First signed-or-unsigned decimal literal in `s`
fn first_decimal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    for start in 0..bytes.len() {
        if let Some(end) = decimal_token_end(bytes, start) {
            if let Ok(value) = s[start..end].parse() {
                return Some(value);
            }
        }
    }
    None
}

/// End index of a decimal number token starting at `at`, if one starts there
///
/// Accepts `[+-]?digits`, `[+-]?digits.digits` and `[+-]?.digits`.
fn decimal_token_end(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at;
    if bytes[i] == b'+' || bytes[i] == b'-' {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let has_int_part = i > int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            return Some(j);
        }
    }

    has_int_part.then_some(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_sample() {
        assert_eq!(parse_line("S42"), Some(Reading::Waveform(42)));
        assert_eq!(parse_line("S512"), Some(Reading::Waveform(512)));
    }

    #[test]
    fn test_bpm_and_ibi() {
        assert_eq!(parse_line("B72"), Some(Reading::Bpm(72)));
        assert_eq!(parse_line("Q830"), Some(Reading::Ibi(830)));
    }

    #[test]
    fn test_tag_without_digits() {
        assert_eq!(parse_line("B"), None);
        assert_eq!(parse_line("S abc"), None);
        assert_eq!(parse_line("Q-"), None);
    }

    #[test]
    fn test_digit_run_stops_at_non_digit() {
        // Only the first maximal run counts.
        assert_eq!(parse_line("S12x34"), Some(Reading::Waveform(12)));
        assert_eq!(parse_line("B=72"), Some(Reading::Bpm(72)));
    }

    #[test]
    fn test_temperature_variants() {
        assert_eq!(parse_line("T-3.5"), Some(Reading::Temperature(-3.5)));
        assert_eq!(parse_line("T23.4"), Some(Reading::Temperature(23.4)));
        assert_eq!(parse_line("T37"), Some(Reading::Temperature(37.0)));
        assert_eq!(parse_line("T+.5"), Some(Reading::Temperature(0.5)));
        assert_eq!(parse_line("T = 36.6 C"), Some(Reading::Temperature(36.6)));
    }

    #[test]
    fn test_temperature_without_number() {
        assert_eq!(parse_line("T"), None);
        assert_eq!(parse_line("Thot"), None);
        assert_eq!(parse_line("T-."), None);
    }

    #[test]
    fn test_unknown_tag_and_empty_line() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("Xhello"), None);
        assert_eq!(parse_line("s42"), None); // tags are case-sensitive
    }

    #[test]
    fn test_oversized_digit_run_is_dropped() {
        // A run that does not fit in i32 is malformed, not a panic.
        assert_eq!(parse_line("S99999999999999999999"), None);
    }
}
