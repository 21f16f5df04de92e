//! Time-course simulation of compiled isotope networks.
//!
//! Provides:
//! - `TransientModel` trait for pluggable dynamic systems
//! - Fixed-step RK4 and forward Euler integrators
//! - `IsotopeModel`, the pool mass/δ system of a bound scenario
//! - Trajectory recording with a mass-conservation check

pub mod error;
pub mod integrator;
pub mod isotope_model;
pub mod model;
pub mod sim;
pub mod trajectory;

pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use isotope_model::{IsotopeModel, PoolState};
pub use model::TransientModel;
pub use sim::{
    IntegratorType, StepSize, TimeCourseOptions, run, run_time_course, shortest_turnover, step_pools,
};
pub use trajectory::{Trajectory, TrajectoryPoint};
