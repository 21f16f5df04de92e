//! Steady-state solving: relaxation with RK4 followed by a Newton polish.

use std::fmt;

use iso_core::{all_finite, epsilon_between, max_abs};
use iso_network::{EvalContext, Network, StateLayout};
use iso_params::BoundScenario;
use iso_sim::{
    IntegratorType, IsotopeModel, PoolState, SimError, Trajectory,
    TrajectoryPoint, TransientModel, shortest_turnover, step_pools,
};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use crate::newton::{NewtonConfig, newton_solve};

/// Tightening applied to both tolerances for the Newton polish.
const POLISH_FACTOR: f64 = 1e-3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteadyStrategy {
    /// March the ODEs forward until rates vanish, then polish with Newton.
    #[default]
    Relaxation,
    /// Newton directly from the scenario's initial state.
    Newton,
}

impl fmt::Display for SteadyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteadyStrategy::Relaxation => write!(f, "relaxation"),
            SteadyStrategy::Newton => write!(f, "newton"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SteadyOptions {
    /// Bound on |dM/dt| for every variable component.
    pub size_tolerance: f64,
    /// Bound on |dδ/dt| / max(|δ|, 1) for every variable component.
    pub relative_tolerance: f64,
    pub strategy: SteadyStrategy,
    /// Relaxation step budget.
    pub max_steps: usize,
    /// Relaxation step as a fraction of the shortest turnover time.
    pub step_fraction: f64,
    /// Recompute the turnover time every N relaxation steps.
    pub turnover_refresh: usize,
    /// Run a Newton polish after relaxation converges.
    pub polish: bool,
    pub newton: NewtonConfig,
}

impl Default for SteadyOptions {
    fn default() -> Self {
        Self {
            size_tolerance: 1e-5,
            relative_tolerance: 1e-3,
            strategy: SteadyStrategy::default(),
            max_steps: 100_000,
            step_fraction: 0.2,
            turnover_refresh: 100,
            polish: true,
            newton: NewtonConfig::default(),
        }
    }
}

impl SteadyOptions {
    fn validate(&self) -> SolverResult<()> {
        if !(self.size_tolerance > 0.0 && self.size_tolerance.is_finite()) {
            return Err(SolverError::InvalidArg {
                what: "size_tolerance must be positive",
            });
        }
        if !(self.relative_tolerance > 0.0 && self.relative_tolerance.is_finite()) {
            return Err(SolverError::InvalidArg {
                what: "relative_tolerance must be positive",
            });
        }
        if !(self.step_fraction > 0.0 && self.step_fraction.is_finite()) {
            return Err(SolverError::InvalidArg {
                what: "step_fraction must be positive",
            });
        }
        if self.turnover_refresh == 0 {
            return Err(SolverError::InvalidArg {
                what: "turnover_refresh must be positive",
            });
        }
        Ok(())
    }
}

/// Steady state of one scenario; vectors are indexed by component slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    pub scenario: String,
    pub components: Vec<String>,
    pub variable: Vec<bool>,
    pub mass: Vec<f64>,
    pub delta: Vec<f64>,
    pub converged: bool,
    pub strategy: SteadyStrategy,
    /// Relaxation steps or Newton iterations spent.
    pub iterations: usize,
    /// Model time marched during relaxation (0 for Newton).
    pub simulated_time: f64,
    pub max_mass_rate: f64,
    pub max_delta_rate: f64,
    /// True when a Newton polish refined the relaxed state.
    pub polished: bool,
}

impl SteadyState {
    pub fn component_slot(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }

    pub fn mass_of(&self, component: &str) -> Option<f64> {
        self.component_slot(component).map(|k| self.mass[k])
    }

    pub fn delta_of(&self, component: &str) -> Option<f64> {
        self.component_slot(component).map(|k| self.delta[k])
    }

    /// Apparent fractionation ε (‰) of `product` relative to `substrate`.
    pub fn fractionation(&self, product: &str, substrate: &str) -> Option<f64> {
        Some(epsilon_between(
            self.delta_of(product)?,
            self.delta_of(substrate)?,
        ))
    }
}

/// Largest |dM/dt| and relative |dδ/dt| over variable components.
#[derive(Debug, Clone, Copy)]
struct Residuals {
    mass: f64,
    delta: f64,
}

impl Residuals {
    fn within(&self, size_tol: f64, rel_tol: f64) -> bool {
        self.mass <= size_tol && self.delta <= rel_tol
    }
}

fn measure(network: &Network, params: &[f64], mass: &[f64], delta: &[f64]) -> Residuals {
    let rates = network.rates(&EvalContext {
        params,
        mass,
        delta,
    });
    let mut mass_rates = Vec::new();
    let mut delta_rates = Vec::new();
    for c in network.variable_components() {
        let k = c.id.slot();
        mass_rates.push(rates.mass[k]);
        delta_rates.push(rates.delta[k] / delta[k].abs().max(1.0));
    }
    let finite = all_finite(&mass_rates) && all_finite(&delta_rates);
    Residuals {
        mass: if finite { max_abs(&mass_rates) } else { f64::INFINITY },
        delta: if finite { max_abs(&delta_rates) } else { f64::INFINITY },
    }
}

/// Solve with default options except the two tolerances.
pub fn solve(
    network: &Network,
    scenario: &BoundScenario,
    size_tolerance: f64,
    relative_tolerance: f64,
) -> SolverResult<SteadyState> {
    solve_steady_state(
        network,
        scenario,
        &SteadyOptions {
            size_tolerance,
            relative_tolerance,
            ..SteadyOptions::default()
        },
    )
}

/// Find the fixed point of the network's ODEs for one bound scenario.
///
/// Fixed components keep their bound values; only variable pools move.
pub fn solve_steady_state(
    network: &Network,
    scenario: &BoundScenario,
    opts: &SteadyOptions,
) -> SolverResult<SteadyState> {
    opts.validate()?;
    info!(
        scenario = scenario.name(),
        strategy = %opts.strategy,
        "solving steady state"
    );
    let state = match opts.strategy {
        SteadyStrategy::Relaxation => relax(network, scenario, opts)?,
        SteadyStrategy::Newton => newton_from(network, scenario, opts)?,
    };
    info!(
        scenario = scenario.name(),
        iterations = state.iterations,
        max_mass_rate = state.max_mass_rate,
        max_delta_rate = state.max_delta_rate,
        polished = state.polished,
        "steady state found"
    );
    Ok(state)
}

struct Draft<'a> {
    network: &'a Network,
    scenario: &'a BoundScenario,
    strategy: SteadyStrategy,
}

impl Draft<'_> {
    fn finish(
        &self,
        mass: Vec<f64>,
        delta: Vec<f64>,
        iterations: usize,
        simulated_time: f64,
        polished: bool,
    ) -> SteadyState {
        let res = measure(self.network, self.scenario.params(), &mass, &delta);
        let components = self.network.components();
        SteadyState {
            scenario: self.scenario.name().to_string(),
            components: components.iter().map(|c| c.name.clone()).collect(),
            variable: components.iter().map(|c| c.variable).collect(),
            mass,
            delta,
            converged: false,
            strategy: self.strategy,
            iterations,
            simulated_time,
            max_mass_rate: res.mass,
            max_delta_rate: res.delta,
            polished,
        }
    }

    fn failure(&self, last: SteadyState) -> SolverError {
        SolverError::Convergence {
            scenario: self.scenario.name().to_string(),
            strategy: self.strategy,
            iterations: last.iterations,
            max_mass_rate: last.max_mass_rate,
            max_delta_rate: last.max_delta_rate,
            last: Box::new(last),
        }
    }
}

fn relaxation_step(
    network: &Network,
    model: &IsotopeModel<'_>,
    x: &PoolState,
    fraction: f64,
) -> Option<f64> {
    shortest_turnover(network, &model.context(x)).map(|t| t * fraction)
}

fn relax(
    network: &Network,
    scenario: &BoundScenario,
    opts: &SteadyOptions,
) -> SolverResult<SteadyState> {
    let draft = Draft {
        network,
        scenario,
        strategy: SteadyStrategy::Relaxation,
    };
    let model = IsotopeModel::new(network, scenario);
    let mut x = model.initial_state();
    let mut t = 0.0;
    let mut dt = relaxation_step(network, &model, &x, opts.step_fraction);

    for step in 0..=opts.max_steps {
        let res = measure(network, scenario.params(), &x.mass, &x.delta);
        if res.within(opts.size_tolerance, opts.relative_tolerance) {
            debug!(scenario = scenario.name(), step, time = t, "relaxation converged");
            let relaxed = draft.finish(x.mass, x.delta, step, t, false);
            let mut state = if opts.polish {
                polish(network, scenario, relaxed, opts)
            } else {
                relaxed
            };
            state.converged = true;
            return Ok(state);
        }
        if step == opts.max_steps {
            break;
        }

        if step > 0 && step % opts.turnover_refresh == 0 {
            if let Some(next) = relaxation_step(network, &model, &x, opts.step_fraction) {
                dt = Some(next);
            }
            debug!(
                scenario = scenario.name(),
                step,
                time = t,
                max_mass_rate = res.mass,
                max_delta_rate = res.delta,
                "relaxation progress"
            );
        }
        let Some(h) = dt else {
            return Err(SolverError::InvalidArg {
                what: "no variable pool drains; relaxation cannot reach a steady state",
            });
        };

        let next = step_pools(&model, IntegratorType::RK4, t, &x, h)?;
        if !next.is_finite() {
            let mut partial = Trajectory::new(network, scenario.name());
            partial.points.push(TrajectoryPoint::from_state(t, &x));
            return Err(SimError::Integration {
                scenario: scenario.name().to_string(),
                time: t,
                step: step + 1,
                partial: Box::new(partial),
            }
            .into());
        }
        x = next;
        t += h;
    }

    let last = draft.finish(x.mass, x.delta, opts.max_steps, t, false);
    Err(draft.failure(last))
}

/// Newton on tolerance-scaled balances, so `‖r‖ < 1` means every balance is within tolerance.
///
/// The isotope residual is `M·dδ/dt` scaled at the starting point, which keeps
/// it linear in δ and independent of `M` when the fluxes are; otherwise Newton
/// could shrink `dδ/dt` by inflating pools.
fn scaled_newton(
    network: &Network,
    scenario: &BoundScenario,
    mass: &[f64],
    delta: &[f64],
    size_tol: f64,
    rel_tol: f64,
    config: &NewtonConfig,
) -> SolverResult<(Vec<f64>, Vec<f64>, usize, bool)> {
    let layout = StateLayout::from_network(network);
    let unpack = |x: &DVector<f64>| {
        let mut m = mass.to_vec();
        let mut d = delta.to_vec();
        layout.unpack(x.as_slice(), &mut m, &mut d);
        (m, d)
    };
    let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let (m, d) = unpack(x);
        let rates = network.rates(&EvalContext {
            params: scenario.params(),
            mass: &m,
            delta: &d,
        });
        let scaled = layout.variables().iter().flat_map(|id| {
            let k = id.slot();
            [
                rates.mass[k] / size_tol,
                rates.delta[k] * m[k] / (mass[k] * delta[k].abs().max(1.0) * rel_tol),
            ]
        });
        Ok(DVector::from_iterator(layout.len(), scaled))
    };
    let jacobian =
        |x: &DVector<f64>| finite_difference_jacobian(x, &residual, config.fd_epsilon);

    let scaled_config = NewtonConfig {
        abs_tol: 1.0,
        rel_tol: 0.0,
        ..config.clone()
    };
    let x0 = DVector::from_vec(layout.pack(mass, delta));
    let result = newton_solve(x0, &residual, jacobian, &scaled_config)?;
    let (m, d) = unpack(&result.x);
    Ok((m, d, result.iterations, result.converged))
}

fn polish(
    network: &Network,
    scenario: &BoundScenario,
    relaxed: SteadyState,
    opts: &SteadyOptions,
) -> SteadyState {
    let draft = Draft {
        network,
        scenario,
        strategy: SteadyStrategy::Relaxation,
    };
    let outcome = scaled_newton(
        network,
        scenario,
        &relaxed.mass,
        &relaxed.delta,
        opts.size_tolerance * POLISH_FACTOR,
        opts.relative_tolerance * POLISH_FACTOR,
        &opts.newton,
    );
    match outcome {
        Ok((mass, delta, iterations, true)) => {
            let polished =
                draft.finish(mass, delta, relaxed.iterations, relaxed.simulated_time, true);
            let res = Residuals {
                mass: polished.max_mass_rate,
                delta: polished.max_delta_rate,
            };
            if res.within(opts.size_tolerance, opts.relative_tolerance) {
                debug!(scenario = scenario.name(), iterations, "newton polish converged");
                polished
            } else {
                warn!(
                    scenario = scenario.name(),
                    iterations, "newton polish left the tolerance band; keeping relaxed state"
                );
                relaxed
            }
        }
        Ok((_, _, iterations, false)) => {
            warn!(
                scenario = scenario.name(),
                iterations, "newton polish did not converge; keeping relaxed state"
            );
            relaxed
        }
        Err(err) => {
            warn!(
                scenario = scenario.name(),
                error = %err,
                "newton polish failed; keeping relaxed state"
            );
            relaxed
        }
    }
}

fn newton_from(
    network: &Network,
    scenario: &BoundScenario,
    opts: &SteadyOptions,
) -> SolverResult<SteadyState> {
    let draft = Draft {
        network,
        scenario,
        strategy: SteadyStrategy::Newton,
    };
    let (mass, delta, iterations, converged) = scaled_newton(
        network,
        scenario,
        scenario.mass(),
        scenario.delta(),
        opts.size_tolerance,
        opts.relative_tolerance,
        &opts.newton,
    )?;
    let mut state = draft.finish(mass, delta, iterations, 0.0, false);
    let res = Residuals {
        mass: state.max_mass_rate,
        delta: state.max_delta_rate,
    };
    if converged && res.within(opts.size_tolerance, opts.relative_tolerance) {
        state.converged = true;
        Ok(state)
    } else {
        Err(draft.failure(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        assert_eq!(SteadyStrategy::default(), SteadyStrategy::Relaxation);
        assert_eq!(SteadyStrategy::Newton.to_string(), "newton");
    }

    #[test]
    fn rejects_non_positive_tolerances() {
        let opts = SteadyOptions {
            size_tolerance: 0.0,
            ..SteadyOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(SolverError::InvalidArg { .. })
        ));
    }

    #[test]
    fn fractionation_between_pools() {
        let s = SteadyState {
            scenario: "s".into(),
            components: vec!["MeOH".into(), "CH4".into()],
            variable: vec![false, true],
            mass: vec![0.0, 1.0],
            delta: vec![-46.2, -121.35],
            converged: true,
            strategy: SteadyStrategy::Relaxation,
            iterations: 0,
            simulated_time: 0.0,
            max_mass_rate: 0.0,
            max_delta_rate: 0.0,
            polished: false,
        };
        let eps = s.fractionation("CH4", "MeOH").unwrap();
        assert!((eps - (878.65 / 953.8 - 1.0) * 1000.0).abs() < 1e-9);
        assert!(s.fractionation("CH4", "lipid").is_none());
    }
}
