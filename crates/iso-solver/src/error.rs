//! Error types for steady-state solving.

use iso_sim::SimError;
use thiserror::Error;

use crate::steady::{SteadyState, SteadyStrategy};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    /// No steady state within budget; `last` is the final unconverged state.
    #[error(
        "Scenario '{scenario}' did not reach steady state with {strategy} after {iterations} iterations (max |dM/dt| = {max_mass_rate:e}, max relative |dδ/dt| = {max_delta_rate:e})"
    )]
    Convergence {
        scenario: String,
        strategy: SteadyStrategy,
        iterations: usize,
        max_mass_rate: f64,
        max_delta_rate: f64,
        last: Box<SteadyState>,
    },

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type SolverResult<T> = Result<T, SolverError>;
