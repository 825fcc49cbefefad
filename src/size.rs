use crate::error::{DupError, Result};

const UNITS: &[(&str, u64)] = &[
    ("B", 1),
    ("K", 1 << 10),
    ("KB", 1 << 10),
    ("M", 1 << 20),
    ("MB", 1 << 20),
    ("G", 1 << 30),
    ("GB", 1 << 30),
    ("T", 1 << 40),
    ("TB", 1 << 40),
];

/// Parses a human-readable byte count such as `"0"`, `"512B"`, `"10k"` or `"5MB"`.
///
/// Units are binary multiples (`1K == 1024`) and case-insensitive. The number
/// must be a non-negative integer immediately followed by the unit.
pub fn parse_size(input: &str) -> Result<u64> {
    let invalid = || DupError::InvalidSizeFormat(input.to_string());

    let upper = input.to_ascii_uppercase();
    let split = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (digits, unit) = upper.split_at(split);

    if digits.is_empty() {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    if unit.is_empty() {
        return Ok(value);
    }
    let multiplier = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, multiplier)| *multiplier)
        .ok_or_else(invalid)?;

    value.checked_mul(multiplier).ok_or_else(invalid)
}
