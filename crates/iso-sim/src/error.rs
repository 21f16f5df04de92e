//! Error types for time-course simulation.

use thiserror::Error;

use crate::trajectory::Trajectory;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The state stopped being finite; `partial` holds every recorded point up to the last valid one.
    #[error(
        "Integration of scenario '{scenario}' diverged after t = {time} (step {step}): state is not finite"
    )]
    Integration {
        scenario: String,
        time: f64,
        step: usize,
        partial: Box<Trajectory>,
    },
}

pub type SimResult<T> = Result<T, SimError>;
