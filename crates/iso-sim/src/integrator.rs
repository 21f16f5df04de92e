//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

pub trait Integrator {
    /// State after one step of length `dt` from `(t, x)`.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical fourth-order Runge-Kutta, four derivative evaluations per step.
#[derive(Clone, Copy, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let half = 0.5 * dt;
        let k1 = model.rhs(t, x)?;
        let k2 = model.rhs(t + half, &model.advance(x, &k1, half))?;
        let k3 = model.rhs(t + half, &model.advance(x, &k2, half))?;
        let k4 = model.rhs(t + dt, &model.advance(x, &k3, dt))?;

        let sixth = dt / 6.0;
        let x = model.advance(x, &k1, sixth);
        let x = model.advance(&x, &k2, 2.0 * sixth);
        let x = model.advance(&x, &k3, 2.0 * sixth);
        Ok(model.advance(&x, &k4, sixth))
    }
}

/// Explicit Euler, one derivative evaluation per step.
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.advance(x, &xdot, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn advance(&self, x: &f64, dx: &f64, h: f64) -> f64 {
            x + h * dx
        }
    }

    fn integrate<I: Integrator>(integrator: I, steps: usize) -> f64 {
        let dt = 1.0 / steps as f64;
        let mut x = Decay.initial_state();
        for i in 0..steps {
            x = integrator.step(&Decay, i as f64 * dt, &x, dt).unwrap();
        }
        x
    }

    #[test]
    fn rk4_is_fourth_order() {
        let exact = (-1.0_f64).exp();
        let coarse = (integrate(RK4, 10) - exact).abs();
        let fine = (integrate(RK4, 20) - exact).abs();
        assert!(coarse < 1e-6);
        assert!(coarse / fine > 12.0);
    }

    #[test]
    fn euler_is_first_order() {
        let exact = (-1.0_f64).exp();
        let coarse = (integrate(ForwardEuler, 100) - exact).abs();
        let fine = (integrate(ForwardEuler, 200) - exact).abs();
        assert!(coarse / fine > 1.8 && coarse / fine < 2.2);
    }
}
