//! Time-course runner and result recording.

use iso_network::{EvalContext, Network};
use iso_params::BoundScenario;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::isotope_model::{IsotopeModel, PoolState};
use crate::model::TransientModel;
use crate::trajectory::{Trajectory, TrajectoryPoint};

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, most accurate, 4 rhs calls per step).
    #[default]
    RK4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    ForwardEuler,
}

/// How the fixed step is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepSize {
    /// `fraction` × the shortest pool turnover time at t = 0.
    Auto { fraction: f64 },
    Fixed(f64),
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize::Auto { fraction: 0.1 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeCourseOptions {
    pub step_count: usize,
    pub step: StepSize,
    pub integrator: IntegratorType,
    /// Record every N-th step (1 = every step); the final step is always recorded.
    pub record_every: usize,
}

impl Default for TimeCourseOptions {
    fn default() -> Self {
        Self {
            step_count: 1000,
            step: StepSize::default(),
            integrator: IntegratorType::default(),
            record_every: 1,
        }
    }
}

/// Shortest `mass / outflow` over variable pools with positive outflow.
///
/// `None` when no variable pool drains.
pub fn shortest_turnover(network: &Network, ctx: &EvalContext<'_>) -> Option<f64> {
    let mut outflow = vec![0.0; network.components().len()];
    for reaction in network.reactions() {
        if let Some(eval) = network.evaluate_reaction(reaction.id, ctx) {
            for s in &eval.sources {
                outflow[s.component.slot()] += s.mass_flux;
            }
        }
    }
    network
        .variable_components()
        .filter(|c| outflow[c.id.slot()] > 0.0)
        .map(|c| ctx.mass[c.id.slot()] / outflow[c.id.slot()])
        .filter(|t| t.is_finite() && *t > 0.0)
        .reduce(f64::min)
}

/// Integrate `step_count` steps with default options.
pub fn run(network: &Network, scenario: &BoundScenario, step_count: usize) -> SimResult<Trajectory> {
    run_time_course(
        network,
        scenario,
        &TimeCourseOptions {
            step_count,
            ..TimeCourseOptions::default()
        },
    )
}

/// Integrate the scenario from its bound initial state.
pub fn run_time_course(
    network: &Network,
    scenario: &BoundScenario,
    opts: &TimeCourseOptions,
) -> SimResult<Trajectory> {
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }
    let dt = match opts.step {
        StepSize::Fixed(dt) => dt,
        StepSize::Auto { fraction } => {
            if !(fraction > 0.0 && fraction.is_finite()) {
                return Err(SimError::InvalidArg {
                    what: "step fraction must be positive",
                });
            }
            shortest_turnover(network, &scenario.context()).ok_or(SimError::InvalidArg {
                what: "no variable pool drains; use a fixed step",
            })? * fraction
        }
    };
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }

    info!(
        scenario = scenario.name(),
        dt,
        steps = opts.step_count,
        "starting time course"
    );

    let model = IsotopeModel::new(network, scenario);
    let mut trajectory = Trajectory::new(network, scenario.name());
    let mut x = model.initial_state();
    trajectory.points.push(TrajectoryPoint::from_state(0.0, &x));

    let log_every = (opts.step_count / 10).max(1);
    for step in 1..=opts.step_count {
        let t = (step - 1) as f64 * dt;
        let next = advance(&model, opts.integrator, t, &x, dt)?;
        if !next.is_finite() {
            if trajectory.last().is_some_and(|p| p.time < t) {
                trajectory.points.push(TrajectoryPoint::from_state(t, &x));
            }
            return Err(SimError::Integration {
                scenario: scenario.name().to_string(),
                time: t,
                step,
                partial: Box::new(trajectory),
            });
        }
        x = next;

        let time = step as f64 * dt;
        if step % opts.record_every == 0 || step == opts.step_count {
            trajectory.points.push(TrajectoryPoint::from_state(time, &x));
        }
        if step % log_every == 0 {
            debug!(scenario = scenario.name(), step, time, "time course progress");
        }
    }

    info!(
        scenario = scenario.name(),
        points = trajectory.len(),
        "time course complete"
    );
    Ok(trajectory)
}

pub(crate) fn advance<M: TransientModel>(
    model: &M,
    integrator: IntegratorType,
    t: f64,
    x: &M::State,
    dt: f64,
) -> SimResult<M::State> {
    match integrator {
        IntegratorType::RK4 => RK4.step(model, t, x, dt),
        IntegratorType::ForwardEuler => ForwardEuler.step(model, t, x, dt),
    }
}

/// Advance an isotope model one step; used by steady-state relaxation.
pub fn step_pools(
    model: &IsotopeModel<'_>,
    integrator: IntegratorType,
    t: f64,
    x: &PoolState,
    dt: f64,
) -> SimResult<PoolState> {
    advance(model, integrator, t, x, dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts = TimeCourseOptions::default();
        assert_eq!(opts.step, StepSize::Auto { fraction: 0.1 });
        assert_eq!(opts.integrator, IntegratorType::RK4);
        assert_eq!(opts.record_every, 1);
    }
}
