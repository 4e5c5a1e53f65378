//! Canonical comparison keys for raw cell values
//!
//! Order and stock exports come out of different spreadsheet tools, so the same
//! SKU may arrive as `123`, `123.0` or `" 123 "`. Everything here is total: any
//! input yields a string, never an error.

use crate::table::CellValue;

/// Sentinel for a variant without a size
pub const NO_SIZE: &str = "NO_SIZE";

/// Spellings that all mean "no size", compared case-insensitively
const NO_SIZE_ALIASES: &[&str] = &["no_size", "no size", "nosize", "no-size"];

/// Normalize a cell into a stable comparison key.
///
/// Empty cells become `""`, integral numbers lose any fractional artifact and
/// text is trimmed with a trailing `.0` removed from all-digit values.
pub fn normalize_key(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(f) if f.is_nan() => String::new(),
        CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => integral_float_text(*f),
        CellValue::Float(f) => f.to_string(),
        CellValue::String(s) => normalize_key_str(s),
    }
}

/// Text form of [`normalize_key`]
pub fn normalize_key_str(s: &str) -> String {
    let trimmed = s.trim();
    match trimmed.strip_suffix(".0") {
        Some(stem) if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) => {
            stem.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Normalize a size cell, collapsing every "no size" spelling to [`NO_SIZE`]
pub fn normalize_size(value: &CellValue) -> String {
    if value.is_empty() {
        return NO_SIZE.to_string();
    }
    normalize_size_str(&value.to_string_value())
}

/// Text form of [`normalize_size`].
///
/// Unlike keys, sizes lose a trailing `.0` whatever precedes it (`"XL.0"` is
/// `"XL"`), repeatedly, so normalizing twice gives the same size.
pub fn normalize_size_str(s: &str) -> String {
    let mut size = s.trim();
    while let Some(stem) = size.strip_suffix(".0") {
        size = stem.trim_end();
    }
    let size = size.to_string();

    if size.is_empty() {
        return NO_SIZE.to_string();
    }

    let folded = size.to_lowercase();
    if NO_SIZE_ALIASES.contains(&folded.as_str()) {
        return NO_SIZE.to_string();
    }

    size
}

/// Case-folded form used for every key comparison
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

fn integral_float_text(f: f64) -> String {
    if f.abs() < i64::MAX as f64 {
        (f as i64).to_string()
    } else {
        format!("{:.0}", f)
    }
}
