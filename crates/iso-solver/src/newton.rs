//! Newton solver with positivity constraints.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Newton solver configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Even slots (pool sizes) must stay above this value
    pub min_mass: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    pub max_line_search_iters: usize,
    /// Relative step for finite-difference Jacobians
    pub fd_epsilon: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-6,
            rel_tol: 1e-6,
            min_mass: 0.0,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            fd_epsilon: 1e-7,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    pub x: DVector<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Solve `J dx = -r`, falling back to a least-squares step when `J` is singular.
///
/// Pool sizes often drop out of the balances entirely (fluxes fixed by
/// parameters), which leaves whole columns of `J` at zero.
fn newton_step(jac: DMatrix<f64>, r: &DVector<f64>) -> SolverResult<DVector<f64>> {
    let rhs = -r.clone();
    if let Some(dx) = jac.clone().lu().solve(&rhs) {
        if dx.iter().all(|v| v.is_finite()) {
            return Ok(dx);
        }
    }
    let svd = jac.svd(true, true);
    let eps = svd.singular_values.max() * 1e-10;
    svd.solve(&rhs, eps)
        .map_err(|e| SolverError::Numeric {
            what: format!("Jacobian solve failed: {e}"),
        })
}

/// Newton solver with line search and positivity constraints.
///
/// Running out of iterations or line-search steps is not an error: the last
/// iterate comes back with `converged = false`.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
            });
        }
        if !r_norm.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("Residual is not finite at iteration {iter}"),
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = newton_step(jac, &r)?;

        // Line search with positivity constraints
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=config.max_line_search_iters {
            let x_new = &x + alpha * &dx;
            let valid = x_new.iter().step_by(2).all(|m| *m > config.min_mass);
            if valid {
                let r_new = residual_fn(&x_new)?;
                let r_new_norm = r_new.norm();
                if r_new_norm < r_norm {
                    accepted = Some((x_new, r_new, r_new_norm));
                    break;
                }
            }
            alpha *= config.line_search_beta;
        }

        let Some((x_new, r_new, r_new_norm)) = accepted else {
            debug!(iter, residual = r_norm, "newton line search stagnated");
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: false,
            });
        };

        debug!(iter, alpha, residual = r_new_norm, "newton iteration");
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    let converged = r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm;
    Ok(NewtonResult {
        x,
        residual_norm: r_norm,
        iterations: config.max_iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0, x > 0
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let result = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap();

        assert!(result.converged);
        assert!((result.x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn singular_direction_is_left_alone() {
        // r = (0, x1 - 3): x0 does not appear
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![0.0, x[1] - 3.0]))
        };
        let jacobian = |_: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]))
        };

        let x0 = DVector::from_vec(vec![7.0, 0.0]);
        let result = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap();
        assert!(result.converged);
        assert_eq!(result.x[0], 7.0);
        assert!((result.x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn positivity_is_enforced() {
        // root at x = -2 is forbidden for a mass slot; stop instead of crossing zero
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] + 2.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> SolverResult<DMatrix<f64>> { Ok(DMatrix::from_element(1, 1, 1.0)) };

        let x0 = DVector::from_element(1, 1.0);
        let result = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap();
        assert!(!result.converged);
        assert!(result.x[0] > 0.0);
    }
}
