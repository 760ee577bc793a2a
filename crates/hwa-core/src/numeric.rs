use crate::CoreError;

/// Floating point type used throughout the service
pub type Real = f64;

/// Value written wherever a physical quantity is undefined
/// (inside the inner boundary, no snapshot near enough in time).
pub const MISSING_SENTINEL: Real = -999.0;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn is_missing(v: Real) -> bool {
    v == MISSING_SENTINEL
}

/// Shortest text that parses back to the same value; the sentinel keeps its
/// integer spelling so downstream readers can match it literally.
pub fn format_value(v: Real) -> String {
    if is_missing(v) {
        "-999".to_string()
    } else {
        format!("{v:e}")
    }
}
