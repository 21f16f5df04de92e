//! iso-params: scenario tables and parameter binding.
//!
//! A `ScenarioTable` names numeric values for parameters, pool sizes
//! (`CH4`) and pool δ values (`CH4.C`). Binding checks the table against a
//! compiled network and produces one `BoundScenario` per scenario, ready to
//! be handed to the integrator or the steady-state solver.

pub mod binder;
pub mod error;
pub mod scenario;

pub use binder::{Binding, BoundScenario, DEFAULT_SCENARIO, bind};
pub use error::{BindError, BindResult};
pub use scenario::{ScenarioDef, ScenarioTable};
