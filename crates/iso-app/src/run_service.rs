//! Run execution and caching service.
//!
//! Scenarios share one compiled network and run in parallel.

use std::path::Path;
use std::time::Instant;

use iso_network::Network;
use iso_params::{Binding, BoundScenario, ScenarioDef, ScenarioTable};
use iso_project::Project;
use iso_results::{RunManifest, RunStore, RunType as ResultsRunType};
use iso_sim::{SimError, StepSize, TimeCourseOptions, Trajectory, run_time_course};
use iso_solver::{SolverError, SteadyOptions, SteadyState, solve_steady_state};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::project_service::{self, CompiledProject};

/// Steady-state or time-course run settings.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Steady(SteadyOptions),
    TimeCourse(TimeCourseOptions),
}

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: iso_results::hash::ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute runs for some scenarios of a project file.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    /// Scenario names; empty selects every scenario.
    pub scenarios: Vec<String>,
    /// Values re-bound on top of each selected scenario.
    pub overrides: Vec<(String, f64)>,
    pub mode: RunMode,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub elapsed_s: f64,
}

fn results_run_type(mode: &RunMode) -> ResultsRunType {
    match mode {
        RunMode::Steady(opts) => ResultsRunType::Steady {
            size_tolerance: opts.size_tolerance,
            relative_tolerance: opts.relative_tolerance,
            strategy: opts.strategy.to_string(),
            max_steps: opts.max_steps,
            step_fraction: opts.step_fraction,
            turnover_refresh: opts.turnover_refresh,
            polish: opts.polish,
        },
        RunMode::TimeCourse(opts) => {
            let (dt, step_fraction) = match opts.step {
                StepSize::Fixed(dt) => (Some(dt), None),
                StepSize::Auto { fraction } => (None, Some(fraction)),
            };
            ResultsRunType::TimeCourse {
                step_count: opts.step_count,
                dt,
                step_fraction,
                record_every: opts.record_every,
                integrator: format!("{:?}", opts.integrator),
            }
        }
    }
}

/// Re-bind the override values on top of every scenario.
fn apply_overrides(
    network: &Network,
    binding: Binding,
    overrides: &[(String, f64)],
) -> AppResult<Binding> {
    if overrides.is_empty() {
        return Ok(binding);
    }
    let mut table = ScenarioTable::new();
    for scenario in &binding {
        let mut def = ScenarioDef::new(scenario.name());
        for (key, value) in overrides {
            def = def.set(key.clone(), *value);
        }
        table = table.with_scenario(def);
    }
    Ok(binding.rebind(network, &table)?)
}

fn select<'b>(binding: &'b Binding, names: &[String]) -> AppResult<Vec<&'b BoundScenario>> {
    if names.is_empty() {
        return Ok(binding.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            binding
                .get(name)
                .ok_or_else(|| AppError::ScenarioNotFound(name.clone()))
        })
        .collect()
}

/// Execute or load runs for the requested scenarios.
pub fn ensure_runs(request: &RunRequest) -> AppResult<Vec<RunResponse>> {
    let project = project_service::load_project(request.project_path)?;
    let CompiledProject { network, binding } = project_service::compile_project(&project)?;
    let binding = apply_overrides(&network, binding, &request.overrides)?;
    let selected = select(&binding, &request.scenarios)?;
    let store = RunStore::for_project(request.project_path)?;
    let run_type = results_run_type(&request.mode);

    info!(
        project = %project.name,
        scenarios = selected.len(),
        run_type = run_type.name(),
        "ensuring runs"
    );

    selected
        .par_iter()
        .map(|scenario| ensure_one(&project, &network, scenario, &store, request, &run_type))
        .collect()
}

fn ensure_one(
    project: &Project,
    network: &Network,
    scenario: &BoundScenario,
    store: &RunStore,
    request: &RunRequest,
    run_type: &ResultsRunType,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let run_id = iso_results::compute_run_id(
        project,
        scenario.values(),
        run_type,
        &request.options.engine_version,
    );

    if request.options.use_cache && store.has_run(&run_id) {
        debug!(scenario = scenario.name(), %run_id, "loading cached run");
        let manifest = store.load_manifest(&run_id)?;
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            elapsed_s: started.elapsed().as_secs_f64(),
        });
    }

    let mut manifest = RunManifest::new(
        run_id.clone(),
        project.name.clone(),
        scenario.name(),
        run_type.clone(),
    )
    .with_components(
        network.components().iter().map(|c| c.name.clone()).collect(),
        network.components().iter().map(|c| c.variable).collect(),
    )
    .with_values(scenario.values().clone());
    manifest.engine_version = request.options.engine_version.clone();

    match &request.mode {
        RunMode::Steady(opts) => {
            let state = solve_steady_state(network, scenario, opts)?;
            store.save_steady(&manifest, &state)?;
        }
        RunMode::TimeCourse(opts) => {
            let trajectory = run_time_course(network, scenario, opts)?;
            store.save_time_course(&manifest, &trajectory)?;
        }
    }

    info!(scenario = scenario.name(), %run_id, "run saved");
    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

/// Steady state of every bound scenario, in table order.
pub fn solve_scenarios(
    network: &Network,
    binding: &Binding,
    opts: &SteadyOptions,
) -> Vec<(String, Result<SteadyState, SolverError>)> {
    binding
        .scenarios()
        .par_iter()
        .map(|s| (s.name().to_string(), solve_steady_state(network, s, opts)))
        .collect()
}

/// Time course of every bound scenario, in table order.
pub fn simulate_scenarios(
    network: &Network,
    binding: &Binding,
    opts: &TimeCourseOptions,
) -> Vec<(String, Result<Trajectory, SimError>)> {
    binding
        .scenarios()
        .par_iter()
        .map(|s| (s.name().to_string(), run_time_course(network, s, opts)))
        .collect()
}

pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs()?)
}

pub fn load_steady(project_path: &Path, run_id: &str) -> AppResult<SteadyState> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load_steady(run_id)?)
}

pub fn load_trajectory(project_path: &Path, run_id: &str) -> AppResult<Trajectory> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load_trajectory(run_id)?)
}

pub fn delete_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.delete_run(run_id)?)
}

pub fn load_manifest(project_path: &Path, run_id: &str) -> AppResult<RunManifest> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load_manifest(run_id)?)
}
