use crate::DsError;

/// Reject NaN and infinities.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, DsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DsError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, DsError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(DsError::InvalidArg { what })
    }
}

pub fn ensure_in_range(v: f64, min: f64, max: f64, what: &'static str) -> Result<f64, DsError> {
    let v = ensure_finite(v, what)?;
    if (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(DsError::OutOfRange {
            what,
            value: v,
            min,
            max,
        })
    }
}
