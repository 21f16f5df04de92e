//! Per-mil (δ) notation and fractionation-factor conversions.
//!
//! Conventions:
//! - δ = (R / R_std − 1) · 1000 ‰
//! - α_{A/B} = R_A / R_B = (δ_A + 1000) / (δ_B + 1000)
//! - ε = (α − 1) · 1000 ‰

use crate::Real;

/// 13C/12C ratio of the VPDB standard.
pub const VPDB_13C: Real = 0.011_180;

/// Isotope ratio for a δ value relative to `r_std`.
pub fn delta_to_ratio(delta: Real, r_std: Real) -> Real {
    (delta / 1000.0 + 1.0) * r_std
}

/// δ value (‰) of an isotope ratio relative to `r_std`.
pub fn ratio_to_delta(ratio: Real, r_std: Real) -> Real {
    (ratio / r_std - 1.0) * 1000.0
}

/// Fractionation factor between two pools given their δ values.
pub fn alpha_between(delta_a: Real, delta_b: Real) -> Real {
    (delta_a + 1000.0) / (delta_b + 1000.0)
}

/// Isotope effect ε_{A/B} (‰) between two pools given their δ values.
pub fn epsilon_between(delta_a: Real, delta_b: Real) -> Real {
    alpha_to_epsilon(alpha_between(delta_a, delta_b))
}

pub fn alpha_to_epsilon(alpha: Real) -> Real {
    (alpha - 1.0) * 1000.0
}

pub fn epsilon_to_alpha(epsilon: Real) -> Real {
    epsilon / 1000.0 + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tolerances, nearly_equal};

    const TOL: Tolerances = Tolerances {
        abs: 1e-12,
        rel: 1e-10,
    };

    #[test]
    fn ratio_delta_inverse() {
        for d in [-120.0, -46.2, 0.0, 15.3] {
            let r = delta_to_ratio(d, VPDB_13C);
            assert!(nearly_equal(ratio_to_delta(r, VPDB_13C), d, TOL));
        }
    }

    #[test]
    fn epsilon_alpha_inverse() {
        assert!(nearly_equal(epsilon_to_alpha(-83.5), 0.9165, TOL));
        assert!(nearly_equal(alpha_to_epsilon(0.9165), -83.5, TOL));
    }

    #[test]
    fn epsilon_between_sign() {
        // product lighter than substrate: negative isotope effect
        let eps = epsilon_between(-121.35, -37.85);
        assert!(eps < 0.0);
        assert!(epsilon_between(5.0, 5.0).abs() < 1e-12);
    }

    proptest::proptest! {
        #[test]
        fn alpha_chains_between_pools(a in -200.0f64..100.0, b in -200.0f64..100.0, c in -200.0f64..100.0) {
            let chained = alpha_between(a, b) * alpha_between(b, c);
            proptest::prop_assert!((chained - alpha_between(a, c)).abs() < 1e-12);
        }
    }
}
