//! Parsers for the flat formats cgroup files use
//!
//! Stat files are newline separated `key value` pairs:
//! ```text
//! nr_periods 456
//! nr_throttled 123
//! throttled_time 45678
//! ```
//! Values are always plain unsigned decimals.

use corral_core::ParseError;

/// Parse one `key value` line
///
/// Surrounding whitespace, including the trailing newline, is ignored.
///
/// # Errors
/// Returns [`ParseError::FieldCount`] unless the line has exactly two
/// fields, and [`ParseError::InvalidValue`] if the value is not an unsigned
/// decimal that fits in a `u64`.
///
/// # Example
/// ```
/// use corral_cgroup::kv::parse_kv;
///
/// assert_eq!(parse_kv("nr_periods 42\n").unwrap(), ("nr_periods", 42));
/// assert!(parse_kv("x -1").is_err());
/// ```
pub fn parse_kv(line: &str) -> Result<(&str, u64), ParseError> {
    let mut fields = line.split_ascii_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(key), Some(value), None) => Ok((key, parse_uint(value)?)),
        _ => Err(ParseError::FieldCount {
            line: line.trim_end().to_string(),
            expected: 2,
            found: line.split_ascii_whitespace().count(),
        }),
    }
}

/// Parse a single unsigned decimal, ignoring surrounding whitespace
///
/// Signs, hex and other non-decimal forms are rejected, so is anything that
/// overflows a `u64`.
///
/// # Errors
/// Returns [`ParseError::InvalidValue`] if the input is not a valid value.
pub fn parse_uint(s: &str) -> Result<u64, ParseError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidValue {
            value: s.to_string(),
            source: None,
        });
    }

    s.parse().map_err(|e| ParseError::InvalidValue {
        value: s.to_string(),
        source: Some(e),
    })
}

/// Parse a limit file where `max` stands for "no limit"
///
/// # Errors
/// Returns [`ParseError::InvalidValue`] if the input is neither `max` nor a
/// valid value.
pub fn parse_limit(s: &str) -> Result<Option<u64>, ParseError> {
    match s.trim() {
        "max" => Ok(None),
        value => parse_uint(value).map(Some),
    }
}

/// Parse a whitespace separated list of unsigned decimals
///
/// # Errors
/// Returns [`ParseError::InvalidValue`] on the first invalid entry.
pub fn parse_uint_list(s: &str) -> Result<Vec<u64>, ParseError> {
    s.split_ascii_whitespace().map(parse_uint).collect()
}
