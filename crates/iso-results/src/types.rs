//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project: String,
    pub scenario: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub run_type: RunType,
    pub engine_version: String,
    /// Component names in slot order, matching the stored vectors.
    pub components: Vec<String>,
    pub variable: Vec<bool>,
    /// Every resolved scenario value the run was computed with.
    pub values: BTreeMap<String, f64>,
}

impl RunManifest {
    /// Manifest stamped with the current time.
    pub fn new(
        run_id: RunId,
        project: impl Into<String>,
        scenario: impl Into<String>,
        run_type: RunType,
    ) -> Self {
        Self {
            run_id,
            project: project.into(),
            scenario: scenario.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_type,
            engine_version: crate::hash::ENGINE_VERSION.to_string(),
            components: Vec::new(),
            variable: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_components(mut self, components: Vec<String>, variable: Vec<bool>) -> Self {
        self.components = components;
        self.variable = variable;
        self
    }

    pub fn with_values(mut self, values: BTreeMap<String, f64>) -> Self {
        self.values = values;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunType {
    Steady {
        size_tolerance: f64,
        relative_tolerance: f64,
        strategy: String,
        max_steps: usize,
        step_fraction: f64,
        turnover_refresh: usize,
        /// Newton polish after relaxation.
        polish: bool,
    },
    TimeCourse {
        step_count: usize,
        /// Fixed step, if any.
        dt: Option<f64>,
        /// Fraction of the shortest turnover time, when the step is derived.
        step_fraction: Option<f64>,
        record_every: usize,
        integrator: String,
    },
}

impl RunType {
    pub fn name(&self) -> &'static str {
        match self {
            RunType::Steady { .. } => "steady",
            RunType::TimeCourse { .. } => "time-course",
        }
    }
}
