//! Run storage API.
//!
//! Layout under the root: `<run_id>/manifest.json` plus either
//! `trajectory.jsonl` (one point per line) or `steady.json`.

use crate::types::{RunManifest, RunType};
use crate::{ResultsError, ResultsResult};
use iso_sim::{Trajectory, TrajectoryPoint};
use iso_solver::SteadyState;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store at `<project dir>/.isoflux/runs`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        let runs_dir = project_dir.join(".isoflux").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    fn write_manifest(&self, manifest: &RunManifest) -> ResultsResult<PathBuf> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;
        Ok(run_dir)
    }

    pub fn save_time_course(
        &self,
        manifest: &RunManifest,
        trajectory: &Trajectory,
    ) -> ResultsResult<()> {
        let run_dir = self.write_manifest(manifest)?;

        let mut content = String::new();
        for point in &trajectory.points {
            let line = serde_json::to_string(point)?;
            content.push_str(&line);
            content.push('\n');
        }
        fs::write(run_dir.join("trajectory.jsonl"), content)?;
        Ok(())
    }

    pub fn save_steady(&self, manifest: &RunManifest, state: &SteadyState) -> ResultsResult<()> {
        let run_dir = self.write_manifest(manifest)?;
        let json = serde_json::to_string_pretty(state)?;
        fs::write(run_dir.join("steady.json"), json)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_trajectory(&self, run_id: &str) -> ResultsResult<Trajectory> {
        let manifest = self.load_manifest(run_id)?;
        if !matches!(manifest.run_type, RunType::TimeCourse { .. }) {
            return Err(ResultsError::WrongRunType {
                run_id: run_id.to_string(),
                expected: "time-course",
            });
        }

        let path = self.run_dir(run_id).join("trajectory.jsonl");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let mut points = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                let point: TrajectoryPoint = serde_json::from_str(line)?;
                points.push(point);
            }
        }

        Ok(Trajectory {
            scenario: manifest.scenario,
            components: manifest.components,
            variable: manifest.variable,
            points,
        })
    }

    pub fn load_steady(&self, run_id: &str) -> ResultsResult<SteadyState> {
        let path = self.run_dir(run_id).join("steady.json");
        if !path.exists() {
            let manifest = self.load_manifest(run_id)?;
            return Err(ResultsError::WrongRunType {
                run_id: manifest.run_id,
                expected: "steady",
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All stored runs, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by_key(|m| {
            chrono::DateTime::parse_from_rfc3339(&m.timestamp)
                .map(|t| t.timestamp_nanos_opt().unwrap_or_default())
                .unwrap_or_default()
        });
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
