use clap::{Parser, Subcommand, ValueEnum};
use iso_app::{
    AppError, AppResult, RunMode, RunOptions, RunRequest, RunResponse, project_service, query,
    run_service,
};
use iso_results::RunType;
use iso_sim::{IntegratorType, StepSize, TimeCourseOptions, Trajectory};
use iso_solver::{SteadyOptions, SteadyStrategy};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iso-cli")]
#[command(about = "isoflux CLI - Isotope fractionation in metabolic networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file and compile its network
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Print the balance equations of every variable component
    Equations {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// List scenarios in a project
    Scenarios {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Print every resolved value
        #[arg(long)]
        values: bool,
    },
    /// Run a simulation
    #[command(subcommand)]
    Run(RunCommands),
    /// List cached runs for a project
    Runs {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
        /// Component that fractionation factors are measured against
        #[arg(long, default_value = "MeOH")]
        reference: String,
    },
    /// Delete a cached run
    DeleteRun {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID to delete
        run_id: String,
    },
    /// Export a time-course run as CSV
    Export {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the built-in methanol project
    Preset {
        /// Output path; `.json` writes JSON, anything else YAML
        #[arg(short, long, default_value = "methanol.yaml")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum RunCommands {
    /// Solve for the steady state
    Steady {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Scenario to run (repeatable; default is every scenario)
        #[arg(short, long)]
        scenario: Vec<String>,
        /// Override a value, e.g. `--set f_CO2=0.75` (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        overrides: Vec<(String, f64)>,
        /// Largest accepted |dM/dt|
        #[arg(long, default_value_t = 1e-5)]
        size_tol: f64,
        /// Largest accepted |dδ/dt| relative to max(|δ|, 1)
        #[arg(long, default_value_t = 1e-3)]
        rel_tol: f64,
        /// Solution strategy
        #[arg(long, value_enum, default_value_t = StrategyArg::Relaxation)]
        strategy: StrategyArg,
        /// Skip Newton polishing after relaxation
        #[arg(long)]
        no_polish: bool,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Integrate a time course from the scenario's initial pools
    TimeCourse {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Scenario to run (repeatable; default is every scenario)
        #[arg(short, long)]
        scenario: Vec<String>,
        /// Override a value, e.g. `--set CH4=5` (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        overrides: Vec<(String, f64)>,
        /// Number of integration steps
        #[arg(long, default_value_t = 1000)]
        steps: usize,
        /// Fixed time step (default: 0.1 × shortest turnover time)
        #[arg(long)]
        dt: Option<f64>,
        /// Record every N-th step
        #[arg(long, default_value_t = 1)]
        record_every: usize,
        /// Integrator
        #[arg(long, value_enum, default_value_t = IntegratorArg::Rk4)]
        integrator: IntegratorArg,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Relaxation,
    Newton,
}

impl From<StrategyArg> for SteadyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Relaxation => SteadyStrategy::Relaxation,
            StrategyArg::Newton => SteadyStrategy::Newton,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum IntegratorArg {
    Rk4,
    Euler,
}

impl From<IntegratorArg> for IntegratorType {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::Rk4 => IntegratorType::RK4,
            IntegratorArg::Euler => IntegratorType::ForwardEuler,
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{key}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Equations { project_path } => cmd_equations(&project_path),
        Commands::Scenarios {
            project_path,
            values,
        } => cmd_scenarios(&project_path, values),
        Commands::Run(run_cmd) => match run_cmd {
            RunCommands::Steady {
                project_path,
                scenario,
                overrides,
                size_tol,
                rel_tol,
                strategy,
                no_polish,
                no_cache,
            } => {
                let opts = SteadyOptions {
                    size_tolerance: size_tol,
                    relative_tolerance: rel_tol,
                    strategy: strategy.into(),
                    polish: !no_polish,
                    ..SteadyOptions::default()
                };
                cmd_run(
                    &project_path,
                    scenario,
                    overrides,
                    RunMode::Steady(opts),
                    !no_cache,
                )
            }
            RunCommands::TimeCourse {
                project_path,
                scenario,
                overrides,
                steps,
                dt,
                record_every,
                integrator,
                no_cache,
            } => {
                let opts = TimeCourseOptions {
                    step_count: steps,
                    step: dt.map_or_else(StepSize::default, StepSize::Fixed),
                    integrator: integrator.into(),
                    record_every,
                };
                cmd_run(
                    &project_path,
                    scenario,
                    overrides,
                    RunMode::TimeCourse(opts),
                    !no_cache,
                )
            }
        },
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
            reference,
        } => cmd_show_run(&project_path, &run_id, &reference),
        Commands::DeleteRun {
            project_path,
            run_id,
        } => {
            run_service::delete_run(&project_path, &run_id)?;
            println!("✓ Deleted run {run_id}");
            Ok(())
        }
        Commands::Export {
            project_path,
            run_id,
            output,
        } => cmd_export(&project_path, &run_id, output.as_deref()),
        Commands::Preset { output } => {
            project_service::save_project(&output, &iso_app::methanol_project())?;
            println!("✓ Wrote methanol project to {}", output.display());
            Ok(())
        }
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    let network = project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    println!(
        "  {} components ({} variable), {} reactions, {} parameters",
        network.components().len(),
        network.variable_components().count(),
        network.reactions().len(),
        network.parameters().len()
    );
    Ok(())
}

fn cmd_equations(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let network = project_service::validate_project(&project)?;
    for row in query::equation_rows(&network) {
        println!("{}:", row.component);
        println!("  dM/dt  = {}", row.mass_rate);
        println!("  dMδ/dt = {}", row.isotope_rate);
        println!("  dδ/dt  = {}", row.delta_rate);
    }
    Ok(())
}

fn cmd_scenarios(project_path: &Path, values: bool) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let compiled = project_service::compile_project(&project)?;
    let summaries = project_service::list_scenarios(&project);

    if summaries.is_empty() {
        println!("No scenarios defined; using defaults only");
    }
    for summary in &summaries {
        match &summary.base {
            Some(base) => println!(
                "  {} (base: {}, {} overrides)",
                summary.name, base, summary.overrides
            ),
            None => println!("  {} ({} overrides)", summary.name, summary.overrides),
        }
    }

    if values {
        for row in query::scenario_rows(&compiled.binding) {
            println!("\n[{}]", row.name);
            for (key, value) in &row.values {
                println!("  {key} = {value}");
            }
        }
    }
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    scenarios: Vec<String>,
    overrides: Vec<(String, f64)>,
    mode: RunMode,
    use_cache: bool,
) -> AppResult<()> {
    debug!(?scenarios, ?overrides, use_cache, "run request");
    let request = RunRequest {
        project_path,
        scenarios,
        overrides,
        mode,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let responses = run_service::ensure_runs(&request)?;
    for response in &responses {
        print_response(project_path, &request.mode, response)?;
    }
    Ok(())
}

fn print_response(project_path: &Path, mode: &RunMode, response: &RunResponse) -> AppResult<()> {
    let scenario = &response.manifest.scenario;
    if response.loaded_from_cache {
        println!("✓ [{scenario}] Loaded from cache: {}", response.run_id);
    } else {
        println!(
            "✓ [{scenario}] Completed in {:.3}s: {}",
            response.elapsed_s, response.run_id
        );
    }

    match mode {
        RunMode::Steady(_) => {
            let state = run_service::load_steady(project_path, &response.run_id)?;
            println!(
                "  {} after {} iterations (t = {:.3}, polished: {})",
                if state.converged { "Converged" } else { "NOT converged" },
                state.iterations,
                state.simulated_time,
                state.polished
            );
            for (k, name) in state.components.iter().enumerate() {
                if state.variable[k] {
                    println!(
                        "  {:<12} M = {:>10.4}  δ = {:>10.4}",
                        name, state.mass[k], state.delta[k]
                    );
                }
            }
        }
        RunMode::TimeCourse(_) => {
            let trajectory = run_service::load_trajectory(project_path, &response.run_id)?;
            print_trajectory_summary(&trajectory);
        }
    }
    Ok(())
}

fn print_trajectory_summary(trajectory: &Trajectory) {
    println!("  Time points: {}", trajectory.len());
    if let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) {
        println!("  Time range: {:.3} - {:.3}", first.time, last.time);
    }
    println!("  Mass balance error: {:.3e}", trajectory.mass_balance_error());
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found");
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} {:<12} {:<12} ({})",
                manifest.run_id,
                manifest.run_type.name(),
                manifest.scenario,
                manifest.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str, reference: &str) -> AppResult<()> {
    println!("Loading run: {run_id}");
    let manifest = run_service::load_manifest(project_path, run_id)?;

    println!("\nRun Summary:");
    println!("  Project: {}", manifest.project);
    println!("  Scenario: {}", manifest.scenario);
    println!("  Type: {}", manifest.run_type.name());
    println!("  Engine: {}", manifest.engine_version);
    println!("  Created: {}", manifest.timestamp);

    match manifest.run_type {
        RunType::Steady { .. } => {
            let state = run_service::load_steady(project_path, run_id)?;
            println!("\nFractionation against {reference}:");
            println!("  {:<12} {:>10} {:>10}", "component", "δ", "ε");
            for row in query::fractionation_rows(&state, reference)? {
                println!(
                    "  {:<12} {:>10.4} {:>10.4}{}",
                    row.component,
                    row.delta,
                    row.epsilon,
                    if row.variable { "" } else { "  (fixed)" }
                );
            }
        }
        RunType::TimeCourse { .. } => {
            let trajectory = run_service::load_trajectory(project_path, run_id)?;
            println!();
            print_trajectory_summary(&trajectory);
        }
    }
    Ok(())
}

fn cmd_export(project_path: &Path, run_id: &str, output: Option<&Path>) -> AppResult<()> {
    let trajectory = run_service::load_trajectory(project_path, run_id)?;
    if trajectory.is_empty() {
        return Err(AppError::InvalidInput(format!("Run {run_id} has no points")));
    }
    let csv = query::trajectory_csv(&trajectory);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            trajectory.len(),
            path.display()
        );
    } else {
        print!("{csv}");
    }

    Ok(())
}
