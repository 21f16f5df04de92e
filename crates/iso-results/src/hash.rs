//! Content-based hashing for run IDs.

use std::collections::BTreeMap;

use iso_project::Project;
use sha2::{Digest, Sha256};

/// Version string mixed into every run ID.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SHA-256 over the project, the resolved scenario values, the run settings
/// and the engine version.
pub fn compute_run_id(
    project: &Project,
    values: &BTreeMap<String, f64>,
    run_type: &crate::types::RunType,
    engine_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    let values_json = serde_json::to_string(values).unwrap_or_default();
    hasher.update(values_json.as_bytes());

    let run_type_json = serde_json::to_string(run_type).unwrap_or_default();
    hasher.update(run_type_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunType;
    use iso_params::ScenarioTable;

    fn project(name: &str) -> Project {
        Project {
            version: 1,
            name: name.to_string(),
            isotope: "C".to_string(),
            components: vec![],
            reactions: vec![],
            scenarios: ScenarioTable::default(),
        }
    }

    fn steady() -> RunType {
        RunType::Steady {
            size_tolerance: 1e-5,
            relative_tolerance: 1e-3,
            strategy: "relaxation".to_string(),
            max_steps: 100_000,
            step_fraction: 0.2,
            turnover_refresh: 100,
            polish: true,
        }
    }

    #[test]
    fn hash_stability() {
        let values = BTreeMap::from([("net".to_string(), 0.1)]);
        let hash1 = compute_run_id(&project("a"), &values, &steady(), "v1");
        let hash2 = compute_run_id(&project("a"), &values, &steady(), "v1");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let values = BTreeMap::from([("net".to_string(), 0.1)]);
        let other = BTreeMap::from([("net".to_string(), 0.2)]);
        let base = compute_run_id(&project("a"), &values, &steady(), "v1");
        assert_ne!(base, compute_run_id(&project("b"), &values, &steady(), "v1"));
        assert_ne!(base, compute_run_id(&project("a"), &other, &steady(), "v1"));
        assert_ne!(base, compute_run_id(&project("a"), &values, &steady(), "v2"));
    }

    #[test]
    fn hash_covers_solver_settings() {
        let values = BTreeMap::from([("net".to_string(), 0.1)]);
        let base = compute_run_id(&project("a"), &values, &steady(), "v1");
        let unpolished = RunType::Steady {
            size_tolerance: 1e-5,
            relative_tolerance: 1e-3,
            strategy: "relaxation".to_string(),
            max_steps: 100_000,
            step_fraction: 0.2,
            turnover_refresh: 100,
            polish: false,
        };
        assert_ne!(base, compute_run_id(&project("a"), &values, &unpolished, "v1"));
    }
}
