//! # Input Policy
//!
//! Sanitisation and the field-length policy applied to every categorical
//! value before it reaches the vocabulary or the reference-code generator.
//!
//! | Field | Rule |
//! |-------|------|
//! | `PARTICULARS` | non-empty after sanitisation |
//! | `CLIENT_CODE`, `SITE_NAME`, `STATE_NAME` | 2–4 characters |
//! | `CAPACITY_MW` | finite, greater than zero, at most [`MAX_CAPACITY_MW`] |
//!
//! No categorical value may contain `/`, the reference-code separator.

use crate::domain::Category;

/// Minimum length of a coded value.
pub const CODE_MIN_LEN: usize = 2;

/// Maximum length of a coded value.
pub const CODE_MAX_LEN: usize = 4;

/// Largest capacity a reference code can carry, in megawatts.
pub const MAX_CAPACITY_MW: f64 = 1_000_000.0;

/// Maximum length of any free-text input after sanitisation.
pub const MAX_TEXT_LEN: usize = 100;

const STRIPPED: [char; 4] = ['<', '>', '\'', '"'];

/// Trim, drop markup and quote characters, and cap at [`MAX_TEXT_LEN`]
/// characters.
pub fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .take(MAX_TEXT_LEN)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Sanitise and upper-case a categorical value.
pub fn normalize_value(raw: &str) -> String {
    sanitize(raw).to_uppercase()
}

/// Check an already-normalised value against the policy for `category`.
///
/// Returns the violation reason on failure.
pub fn check_value(category: Category, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("is required".to_string());
    }
    if value.contains('/') {
        return Err("must not contain '/'".to_string());
    }
    if category.is_coded() {
        let len = value.chars().count();
        if !(CODE_MIN_LEN..=CODE_MAX_LEN).contains(&len) {
            return Err(format!(
                "must be {CODE_MIN_LEN}-{CODE_MAX_LEN} characters (got {len})"
            ));
        }
    }
    Ok(())
}

/// Check a capacity in megawatts.
pub fn check_capacity(capacity_mw: f64) -> Result<(), String> {
    if !capacity_mw.is_finite() {
        return Err("must be a finite number".to_string());
    }
    if capacity_mw <= 0.0 {
        return Err("must be greater than 0".to_string());
    }
    if capacity_mw > MAX_CAPACITY_MW {
        return Err(format!("must be at most {MAX_CAPACITY_MW} MW"));
    }
    Ok(())
}
