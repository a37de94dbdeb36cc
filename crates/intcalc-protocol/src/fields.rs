//! Whole-token parsing of the numeric job fields.
//!
//! Job-file lines and integrate paths share these rules: a field must be
//! exactly one numeric token, with no padding and no trailing characters.

/// Why a count field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountError {
    /// Not an integer token, or at or beyond the largest representable value.
    Malformed,
    /// An integer below 1.
    NotPositive,
}

/// Parses a finite bound.
///
/// Returns `None` for anything that is not exactly one finite
/// floating-point token.
#[must_use]
pub fn parse_bound(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a positive segment or thread count.
///
/// # Errors
///
/// Returns [`CountError::Malformed`] for non-integer text and for values at
/// or above `i64::MAX`, and [`CountError::NotPositive`] for values below 1.
pub fn parse_count(text: &str) -> Result<u64, CountError> {
    let value = text.parse::<i64>().map_err(|_| CountError::Malformed)?;
    if value == i64::MAX {
        return Err(CountError::Malformed);
    }
    if value < 1 {
        return Err(CountError::NotPositive);
    }
    u64::try_from(value).map_err(|_| CountError::Malformed)
}

/// Formats a bound so that [`parse_bound`] recovers it exactly.
#[must_use]
pub fn format_bound(value: f64) -> String {
    value.to_string()
}
