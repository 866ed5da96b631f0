//! Byte-size normalization boundary
//!
//! External tools report sizes as suffixed decimal strings whose decimal
//! separator depends on the system locale (`1.5G` or `1,5G`). Everything
//! past this module works in exact `u64` byte counts; formatting back to
//! human units happens only at the logging/reporting boundary.

use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;
const TIB: u64 = 1024 * GIB;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSizeError {
    #[error("empty size string")]
    Empty,
    #[error("invalid size string: {0:?}")]
    Invalid(String),
}

/// Parse a size string into exact bytes.
///
/// Accepts plain integers (`"1048576"`) and values with a binary unit
/// suffix (`"300K"`, `"1.5G"`, `"12,5g"`, `"2TiB"`). Suffixes are
/// case-insensitive; an optional trailing `B`/`iB` is tolerated. Both `.`
/// and `,` are accepted as the decimal separator.
pub fn parse_size(input: &str) -> Result<u64, ParseSizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseSizeError::Empty);
    }

    let (number, multiplier) = split_suffix(trimmed)?;
    let normalized = number.replace(',', ".");
    if normalized.is_empty() {
        return Err(ParseSizeError::Invalid(input.to_string()));
    }

    // Whole numbers stay exact; the float path is only for fractional
    // quantities, which are inherently rounded.
    if let Ok(value) = normalized.parse::<u64>() {
        return value
            .checked_mul(multiplier)
            .ok_or_else(|| ParseSizeError::Invalid(input.to_string()));
    }

    let value: f64 = normalized
        .parse()
        .map_err(|_| ParseSizeError::Invalid(input.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ParseSizeError::Invalid(input.to_string()));
    }

    Ok((value * multiplier as f64).round() as u64)
}

fn split_suffix(input: &str) -> Result<(&str, u64), ParseSizeError> {
    let stripped = input
        .strip_suffix("iB")
        .or_else(|| input.strip_suffix("ib"))
        .or_else(|| input.strip_suffix('B'))
        .or_else(|| input.strip_suffix('b'))
        .unwrap_or(input);

    let Some(last) = stripped.chars().last() else {
        return Err(ParseSizeError::Empty);
    };

    let multiplier = match last.to_ascii_lowercase() {
        'k' => KIB,
        'm' => MIB,
        'g' => GIB,
        't' => TIB,
        _ if last.is_ascii_digit() => return Ok((stripped, 1)),
        _ => return Err(ParseSizeError::Invalid(input.to_string())),
    };

    Ok((&stripped[..stripped.len() - last.len_utf8()], multiplier))
}

/// Convert bytes to a human-readable string (e.g. `"1.5 GiB"`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut unit_index = 0;
    let mut value = bytes as f64;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{value:.1} {}", UNITS[unit_index])
    }
}
