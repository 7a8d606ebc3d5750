//! Deterministic 32.32 fixed-point helpers.
//!
//! Every quantity that feeds back into simulation state (spice, health,
//! speeds, credits) is a [`FixedPoint`] so that replays produce identical
//! results on every platform. Square roots and distances are computed with
//! integer arithmetic only.

use fixed::types::I32F32;

/// Fixed-point number with 32 integer and 32 fractional bits.
pub type FixedPoint = I32F32;

/// `1/sqrt(2)`, the per-axis speed factor for diagonal travel.
pub const DIAGONAL_SPEED_CONST: FixedPoint = FixedPoint::from_bits(3_037_000_500);

/// `sqrt(2) - 1`, the extra cost of a diagonal step in block distances.
pub const DIAGONAL_COST_MINUS_ONE: FixedPoint = FixedPoint::from_bits(1_779_033_704);

/// Smallest tolerance used when snapping positions onto tile centres.
pub const FIXED_EPSILON: FixedPoint = FixedPoint::from_bits(1 << 22);

/// Builds a fixed-point value from an integer.
#[must_use]
pub fn fix(value: i32) -> FixedPoint {
    FixedPoint::from_num(value)
}

/// Rounds half away from zero, saturating at the bounds of `i32`.
#[must_use]
pub fn round_to_i32(value: FixedPoint) -> i32 {
    value.round().saturating_to_num::<i32>()
}

/// Square root of a fixed-point number, truncated to the last fractional bit.
///
/// Negative inputs yield zero.
#[must_use]
pub fn fixed_sqrt(value: FixedPoint) -> FixedPoint {
    if value <= FixedPoint::ZERO {
        return FixedPoint::ZERO;
    }

    let bits = u128::from(value.to_bits().unsigned_abs());
    let root = isqrt(bits << FixedPoint::FRAC_NBITS);
    FixedPoint::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

/// Euclidean length of `(dx, dy)` rounded to the nearest integer.
///
/// Equivalent to `lround(sqrt(dx*dx + dy*dy))` without touching floats.
#[must_use]
pub fn rounded_length(dx: i32, dy: i32) -> i32 {
    let dx = u128::from(dx.unsigned_abs());
    let dy = u128::from(dy.unsigned_abs());
    let squared = dx * dx + dy * dy;
    let root = isqrt(squared);
    let rounded = if squared > root * root + root {
        root + 1
    } else {
        root
    };
    i32::try_from(rounded).unwrap_or(i32::MAX)
}

fn isqrt(value: u128) -> u128 {
    let mut remainder = value;
    let mut result = 0u128;
    let mut bit = 1u128 << 126;

    while bit > remainder {
        bit >>= 2;
    }

    while bit != 0 {
        if remainder >= result + bit {
            remainder -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }

    result
}

/// Serializes a [`FixedPoint`] as its raw `i64` bit pattern.
///
/// Use with `#[serde(with = "arrakis_core::fixed_serde")]`.
pub mod fixed_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::FixedPoint;

    /// Writes the raw bit pattern.
    pub fn serialize<S>(value: &FixedPoint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.to_bits())
    }

    /// Reads the raw bit pattern.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<FixedPoint, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(FixedPoint::from_bits)
    }
}
