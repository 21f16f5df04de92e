//! Steady-state solving for compiled isotope networks.
//!
//! Provides:
//! - Relaxation (RK4 marching with turnover-scaled steps) plus Newton polish
//! - Direct Newton iteration with positivity constraints on pool sizes
//! - Finite-difference Jacobians

pub mod error;
pub mod jacobian;
pub mod newton;
pub mod steady;

pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
pub use steady::{SteadyOptions, SteadyState, SteadyStrategy, solve, solve_steady_state};
