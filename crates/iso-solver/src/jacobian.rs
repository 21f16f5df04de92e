//! Finite-difference Jacobian of a pool residual.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Jacobian of `f` at `x` by central differences.
///
/// The step for column j is `epsilon * max(|x[j]|, 1)`. A column whose
/// backward point would cross zero from a positive value (a pool mass close to
/// empty) uses a forward difference instead.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let f0 = f(x)?;
    let mut jac = DMatrix::zeros(f0.len(), x.len());
    let mut shifted = x.clone();

    for j in 0..x.len() {
        let h = epsilon * x[j].abs().max(1.0);

        shifted[j] = x[j] + h;
        let ahead = f(&shifted)?;
        let column = if x[j] > 0.0 && x[j] - h <= 0.0 {
            (ahead - &f0) / h
        } else {
            shifted[j] = x[j] - h;
            let behind = f(&shifted)?;
            (ahead - behind) / (2.0 * h)
        };
        shifted[j] = x[j];

        jac.set_column(j, &column);
    }

    Ok(jac)
}
