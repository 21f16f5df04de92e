//! Error types for the iso-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Scenario binding failed: {0}")]
    Binding(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for iso-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<iso_project::ProjectError> for AppError {
    fn from(err: iso_project::ProjectError) -> Self {
        match err {
            iso_project::ProjectError::Network(e) => e.into(),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<iso_network::ConfigurationError> for AppError {
    fn from(err: iso_network::ConfigurationError) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<iso_params::BindError> for AppError {
    fn from(err: iso_params::BindError) -> Self {
        AppError::Binding(err.to_string())
    }
}

impl From<iso_solver::SolverError> for AppError {
    fn from(err: iso_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<iso_sim::SimError> for AppError {
    fn from(err: iso_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<iso_results::ResultsError> for AppError {
    fn from(err: iso_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
