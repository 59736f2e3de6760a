//! Float-to-paise boundary conversion.
//!
//! Everything inside the core is an `i64` count of paise (the smallest
//! currency unit). This module is the only place a floating-point price is
//! allowed to exist, and only on the way in from an external caller.

use thiserror::Error;

/// Error converting an external floating-point price into paise.
#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    /// The input was not finite (`NaN` or infinite).
    #[error("price {0} is not finite")]
    NotFinite(f64),

    /// The input was negative.
    #[error("price {0} is negative")]
    Negative(f64),

    /// The input cannot be represented in paise without losing more than
    /// the tolerated rounding error.
    #[error("price {0} is not representable in paise")]
    NotRepresentable(f64),
}

const ROUND_TRIP_TOLERANCE: f64 = 1e-6;

/// Convert an external floating-point price to an integer paise amount.
///
/// Multiplies by 100 and rounds to nearest, rejecting inputs that are
/// non-finite, negative, or whose rounded paise value does not round-trip
/// back within [`ROUND_TRIP_TOLERANCE`] of the original float.
pub fn to_paise(price: f64) -> Result<i64, MoneyError> {
    if !price.is_finite() {
        return Err(MoneyError::NotFinite(price));
    }
    if price < 0.0 {
        return Err(MoneyError::Negative(price));
    }

    let scaled = price * 100.0;
    let paise = scaled.round();

    if (scaled - paise).abs() > ROUND_TRIP_TOLERANCE * 100.0 {
        return Err(MoneyError::NotRepresentable(price));
    }

    Ok(paise as i64)
}

/// Convert an integer paise amount back to an external floating-point price.
pub fn from_paise(paise: i64) -> f64 {
    paise as f64 / 100.0
}
