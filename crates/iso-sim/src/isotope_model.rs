//! Pool mass and δ dynamics of one bound scenario.

use iso_network::{EvalContext, Network};
use iso_params::BoundScenario;

use crate::error::SimResult;
use crate::model::TransientModel;

/// Per-component state, indexed by component slot.
///
/// `exchange` accumulates the mass each fixed component has received
/// (negative for sources) and stays zero for variable components.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolState {
    pub mass: Vec<f64>,
    pub delta: Vec<f64>,
    pub exchange: Vec<f64>,
}

impl PoolState {
    pub fn is_finite(&self) -> bool {
        self.mass
            .iter()
            .chain(&self.delta)
            .chain(&self.exchange)
            .all(|v| v.is_finite())
    }

    /// `self + h * rate`.
    fn offset_by(&self, rate: &PoolState, h: f64) -> PoolState {
        let step = |x: &[f64], dx: &[f64]| -> Vec<f64> {
            x.iter().zip(dx).map(|(x, dx)| x + h * dx).collect()
        };
        PoolState {
            mass: step(&self.mass, &rate.mass),
            delta: step(&self.delta, &rate.delta),
            exchange: step(&self.exchange, &rate.exchange),
        }
    }
}

/// The compiled ODE system evaluated with one scenario's parameters.
///
/// Fixed components have zero derivatives, so they keep their bound values.
#[derive(Debug, Clone, Copy)]
pub struct IsotopeModel<'a> {
    network: &'a Network,
    scenario: &'a BoundScenario,
}

impl<'a> IsotopeModel<'a> {
    pub fn new(network: &'a Network, scenario: &'a BoundScenario) -> Self {
        Self { network, scenario }
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn scenario(&self) -> &'a BoundScenario {
        self.scenario
    }

    pub fn context<'s>(&'s self, x: &'s PoolState) -> EvalContext<'s> {
        EvalContext {
            params: self.scenario.params(),
            mass: &x.mass,
            delta: &x.delta,
        }
    }
}

impl TransientModel for IsotopeModel<'_> {
    type State = PoolState;

    fn initial_state(&self) -> PoolState {
        PoolState {
            mass: self.scenario.mass().to_vec(),
            delta: self.scenario.delta().to_vec(),
            exchange: vec![0.0; self.scenario.mass().len()],
        }
    }

    fn rhs(&self, _t: f64, x: &PoolState) -> SimResult<PoolState> {
        let rates = self.network.rates(&self.context(x));
        Ok(PoolState {
            mass: rates.mass,
            delta: rates.delta,
            exchange: rates.exchange,
        })
    }

    fn advance(&self, x: &PoolState, dx: &PoolState, h: f64) -> PoolState {
        x.offset_by(dx, h)
    }
}
