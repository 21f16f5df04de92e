/// Scalar type for masses, rates and δ values.
pub type Real = f64;

/// Absolute plus relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
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

/// `|a - b|` within `abs`, or within `rel` of the larger magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

pub fn all_finite(values: &[Real]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Largest absolute value in the slice (0 for an empty slice).
pub fn max_abs(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc: Real, v| acc.max(v.abs()))
}
