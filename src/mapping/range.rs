//! Integer range mapping
//!
//! Linear rescaling between integer ranges with floor division, the same
//! arithmetic sensor firmware uses for calibration. Output is never clamped
//! here; callers clamp into the range they mapped to. Intermediate products
//! are widened to `i128`, so any `i64` input maps without overflow and results
//! beyond `i64` saturate.

use crate::error::RangeError;

/// Division rounding toward negative infinity
fn floor_div(a: i128, b: i128) -> i128 {
    let q = a.saturating_div(b);
    if a.checked_rem(b).unwrap_or(0) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn scale(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    let numerator = (i128::from(x) - i128::from(in_min))
        .saturating_mul(i128::from(out_max) - i128::from(out_min));
    let y = floor_div(numerator, i128::from(in_max) - i128::from(in_min))
        .saturating_add(i128::from(out_min));
    y.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Map `x` from `[in_min, in_max]` to `[out_min, out_max]`
///
/// Computes `floor((x - in_min) * (out_max - out_min) / (in_max - in_min)) + out_min`.
/// Inputs outside the input range extrapolate.
///
/// # Panics
///
/// Panics if `in_min == in_max`. Use [`RangeMapper::new`] to validate a range
/// up front.
pub fn map_range(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    assert!(in_min != in_max, "map_range: degenerate input range {}", in_min);
    scale(x, in_min, in_max, out_min, out_max)
}

/// Clamp `x` into the range spanned by `a` and `b`, in either order
pub fn clamp_to(x: i64, a: i64, b: i64) -> i64 {
    x.clamp(a.min(b), a.max(b))
}

/// A validated linear mapping between two integer ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMapper {
    in_min: i64,
    in_max: i64,
    out_min: i64,
    out_max: i64,
}

impl RangeMapper {
    /// Create a mapper, rejecting an empty input range
    pub fn new(in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> Result<Self, RangeError> {
        if in_min == in_max {
            return Err(RangeError::Degenerate(in_min));
        }
        Ok(Self {
            in_min,
            in_max,
            out_min,
            out_max,
        })
    }

    /// Map without clamping
    pub fn map(&self, x: i64) -> i64 {
        scale(x, self.in_min, self.in_max, self.out_min, self.out_max)
    }

    /// Map, then clamp into the output range
    pub fn map_clamped(&self, x: i64) -> i64 {
        clamp_to(self.map(x), self.out_min, self.out_max)
    }
}
