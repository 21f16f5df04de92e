//! Shared application service layer for isoflux.
//!
//! Centralizes project loading and compilation, parallel scenario runs with
//! result caching, and tabular queries for front ends.

pub mod error;
pub mod preset;
pub mod project_service;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use preset::{methanol_network, methanol_project};
pub use project_service::{
    CompiledProject, ScenarioSummary, compile_project, list_scenarios, load_project,
    save_project, validate_project,
};
pub use query::{
    EquationRow, FractionationRow, ScenarioRow, equation_rows, fractionation_rows,
    scenario_rows, trajectory_csv,
};
pub use run_service::{
    RunMode, RunOptions, RunRequest, RunResponse, delete_run, ensure_runs, list_runs,
    load_manifest, load_steady, load_trajectory, simulate_scenarios, solve_scenarios,
};
