//! Presentation rounding
//!
//! Confidence values stay at full precision through the pipeline and are
//! rounded only when written into a response.

/// Round to a fixed number of decimal places, exact ties to even
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Confidence as reported to callers: 4 decimal places
#[inline]
pub fn round_confidence(value: f64) -> f64 {
    round_to(value, 4)
}

/// Confidence as a percentage with one decimal, for templated text
#[inline]
pub fn confidence_percent(value: f64) -> f64 {
    round_to(value * 100.0, 1)
}
