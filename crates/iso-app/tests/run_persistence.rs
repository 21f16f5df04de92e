use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use iso_app::{
    RunMode, RunOptions, RunRequest, ensure_runs, list_runs, load_steady, load_trajectory,
    methanol_project, save_project, trajectory_csv,
};
use iso_sim::{StepSize, TimeCourseOptions};
use iso_solver::SteadyOptions;

fn project_file(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("methanol.yaml");
    save_project(&path, &methanol_project()).unwrap();
    path
}

#[test]
fn steady_runs_are_cached() {
    let path = project_file("iso_app_steady");
    let request = RunRequest {
        project_path: &path,
        scenarios: vec!["base".to_string()],
        overrides: vec![],
        mode: RunMode::Steady(SteadyOptions::default()),
        options: RunOptions::default(),
    };

    let first = ensure_runs(&request).unwrap();
    assert_eq!(first.len(), 1);
    assert!(!first[0].loaded_from_cache);

    let second = ensure_runs(&request).unwrap();
    assert!(second[0].loaded_from_cache);
    assert_eq!(second[0].run_id, first[0].run_id);

    let state = load_steady(&path, &first[0].run_id).unwrap();
    assert!(state.converged);
    assert_eq!(list_runs(&path).unwrap().len(), 1);

    let overridden = ensure_runs(&RunRequest {
        overrides: vec![("f_CO2".to_string(), 0.75), ("f_CH4".to_string(), 0.15)],
        ..request
    })
    .unwrap();
    assert_ne!(overridden[0].run_id, first[0].run_id);
    assert_eq!(overridden[0].manifest.values["f_CO2"], 0.75);
}

#[test]
fn steady_settings_change_the_run_id() {
    let path = project_file("iso_app_polish");
    let polished = RunRequest {
        project_path: &path,
        scenarios: vec!["base".to_string()],
        overrides: vec![],
        mode: RunMode::Steady(SteadyOptions::default()),
        options: RunOptions::default(),
    };
    let first = ensure_runs(&polished).unwrap();

    let unpolished = ensure_runs(&RunRequest {
        mode: RunMode::Steady(SteadyOptions {
            polish: false,
            ..SteadyOptions::default()
        }),
        ..polished
    })
    .unwrap();
    assert!(!unpolished[0].loaded_from_cache);
    assert_ne!(unpolished[0].run_id, first[0].run_id);
    assert!(!load_steady(&path, &unpolished[0].run_id).unwrap().polished);
    assert_eq!(list_runs(&path).unwrap().len(), 2);
}

#[test]
fn time_course_runs_all_scenarios() {
    let path = project_file("iso_app_time_course");
    let responses = ensure_runs(&RunRequest {
        project_path: &path,
        scenarios: vec![],
        overrides: vec![],
        mode: RunMode::TimeCourse(TimeCourseOptions {
            step_count: 20,
            step: StepSize::Fixed(5.0),
            ..TimeCourseOptions::default()
        }),
        options: RunOptions::default(),
    })
    .unwrap();
    assert_eq!(responses.len(), 2);

    let trajectory = load_trajectory(&path, &responses[0].run_id).unwrap();
    assert_eq!(trajectory.len(), 21);
    assert!(trajectory.mass_balance_error() < 1e-9);
    let csv = trajectory_csv(&trajectory);
    assert_eq!(csv.lines().count(), 22);
    assert!(csv.starts_with("time,MeOH_mass,MeOH_delta,CH3X_mass"));
}

#[test]
fn unknown_scenario_is_reported() {
    let path = project_file("iso_app_unknown");
    let err = ensure_runs(&RunRequest {
        project_path: &path,
        scenarios: vec!["missing".to_string()],
        overrides: vec![],
        mode: RunMode::Steady(SteadyOptions::default()),
        options: RunOptions::default(),
    })
    .unwrap_err();
    assert!(matches!(err, iso_app::AppError::ScenarioNotFound(_)));
}
