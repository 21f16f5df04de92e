//! Dynamic system interface shared by the integrators.

use crate::error::SimResult;

/// An ODE system `dx/dt = f(t, x)` over an owned state.
pub trait TransientModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// Time derivative of every state entry.
    fn rhs(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// `x + h * dx`, entry by entry.
    fn advance(&self, x: &Self::State, dx: &Self::State, h: f64) -> Self::State;
}
