use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use iso_results::{ResultsError, RunManifest, RunStore, RunType};
use iso_sim::{Trajectory, TrajectoryPoint};
use iso_solver::{SteadyState, SteadyStrategy};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn components() -> (Vec<String>, Vec<bool>) {
    (
        vec!["MeOH".to_string(), "CH4".to_string()],
        vec![false, true],
    )
}

fn trajectory() -> Trajectory {
    let (components, variable) = components();
    Trajectory {
        scenario: "base".to_string(),
        components,
        variable,
        points: vec![
            TrajectoryPoint {
                time: 0.0,
                mass: vec![0.0, 10.0],
                delta: vec![-46.2, 0.0],
                exchange: vec![0.0, 0.0],
            },
            TrajectoryPoint {
                time: 2.0,
                mass: vec![0.0, 10.0],
                delta: vec![-46.2, -1.5],
                exchange: vec![-0.2, 0.0],
            },
        ],
    }
}

fn time_course_manifest(run_id: &str, timestamp: &str) -> RunManifest {
    let (components, variable) = components();
    let mut manifest = RunManifest::new(
        run_id.to_string(),
        "methanol",
        "base",
        RunType::TimeCourse {
            step_count: 1,
            dt: Some(2.0),
            step_fraction: None,
            record_every: 1,
            integrator: "RK4".to_string(),
        },
    )
    .with_components(components, variable);
    manifest.timestamp = timestamp.to_string();
    manifest
}

#[test]
fn save_list_load_roundtrip() {
    let project_dir = unique_temp_dir("iso_results_project");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    let project_path = project_dir.join("project.yaml");
    fs::write(&project_path, "version: 1\nname: test\n").expect("failed to write project file");

    let store = RunStore::for_project(&project_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".isoflux/runs"));

    let later = time_course_manifest("run-b", "2026-03-01T00:00:00+00:00");
    let earlier = time_course_manifest("run-a", "2026-02-26T00:00:00+00:00");
    store.save_time_course(&later, &trajectory()).unwrap();
    store.save_time_course(&earlier, &trajectory()).unwrap();

    let runs = store.list_runs().expect("failed to list runs");
    let ids: Vec<_> = runs.iter().map(|m| m.run_id.as_str()).collect();
    assert_eq!(ids, ["run-a", "run-b"]);

    assert!(store.has_run("run-a"));
    assert_eq!(store.load_manifest("run-a").unwrap(), earlier);
    assert_eq!(store.load_trajectory("run-a").unwrap(), trajectory());

    store.delete_run("run-a").unwrap();
    assert!(!store.has_run("run-a"));
    assert!(matches!(
        store.load_manifest("run-a"),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn steady_runs_roundtrip() {
    let store = RunStore::new(unique_temp_dir("iso_results_steady")).unwrap();
    let (components, variable) = components();
    let state = SteadyState {
        scenario: "base".to_string(),
        components: components.clone(),
        variable: variable.clone(),
        mass: vec![0.0, 10.0],
        delta: vec![-46.2, -129.7],
        converged: true,
        strategy: SteadyStrategy::Relaxation,
        iterations: 42,
        simulated_time: 840.0,
        max_mass_rate: 0.0,
        max_delta_rate: 1e-4,
        polished: true,
    };
    let manifest = RunManifest::new(
        "steady-1".to_string(),
        "methanol",
        "base",
        RunType::Steady {
            size_tolerance: 1e-5,
            relative_tolerance: 1e-3,
            strategy: "relaxation".to_string(),
            max_steps: 100_000,
            step_fraction: 0.2,
            turnover_refresh: 100,
            polish: true,
        },
    )
    .with_components(components, variable);

    store.save_steady(&manifest, &state).unwrap();
    assert_eq!(store.load_steady("steady-1").unwrap(), state);
    assert!(matches!(
        store.load_trajectory("steady-1"),
        Err(ResultsError::WrongRunType { .. })
    ));
}
