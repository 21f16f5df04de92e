//! Project loading, saving, validation, and compilation.

use std::path::Path;

use iso_network::Network;
use iso_params::{Binding, bind};
use iso_project::Project;
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};

/// A compiled network plus its bound scenario table.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub network: Network,
    pub binding: Binding,
}

/// Summary of a scenario for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub base: Option<String>,
    /// Keys set by the scenario itself.
    pub overrides: usize,
}

/// Load project from a YAML or JSON file.
pub fn load_project(path: &Path) -> AppResult<Project> {
    if !path.exists() {
        return Err(AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(iso_project::load(path)?)
}

/// Save project by extension: `.json` as JSON, anything else as YAML.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => iso_project::save_json(path, project)?,
        _ => iso_project::save_yaml(path, project)?,
    }
    Ok(())
}

/// Validate the file and compile the network, without binding scenarios.
pub fn validate_project(project: &Project) -> AppResult<Network> {
    Ok(iso_project::build_network(project)?)
}

/// Compile the network and bind every scenario.
pub fn compile_project(project: &Project) -> AppResult<CompiledProject> {
    let network = iso_project::build_network(project)?;
    let binding = bind(&network, &project.scenarios)?;
    info!(
        project = %project.name,
        components = network.components().len(),
        reactions = network.reactions().len(),
        scenarios = binding.len(),
        "project compiled"
    );
    Ok(CompiledProject { network, binding })
}

/// List all scenarios in the project's table.
pub fn list_scenarios(project: &Project) -> Vec<ScenarioSummary> {
    project
        .scenarios
        .scenarios
        .iter()
        .map(|s| ScenarioSummary {
            name: s.name.clone(),
            base: s.base.clone(),
            overrides: s.values.len(),
        })
        .collect()
}
