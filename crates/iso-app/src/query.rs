//! Tabular views of networks, scenario tables and results.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use iso_network::Network;
use iso_params::Binding;
use iso_sim::Trajectory;
use iso_solver::SteadyState;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// One scenario with every resolved value.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

/// Balance equations of one variable component, pretty-printed.
#[derive(Debug, Clone, Serialize)]
pub struct EquationRow {
    pub component: String,
    pub mass_rate: String,
    pub isotope_rate: String,
    pub delta_rate: String,
}

/// Steady-state δ of one component and its ε against a reference pool.
#[derive(Debug, Clone, Serialize)]
pub struct FractionationRow {
    pub component: String,
    pub variable: bool,
    pub delta: f64,
    pub epsilon: f64,
}

pub fn scenario_rows(binding: &Binding) -> Vec<ScenarioRow> {
    binding
        .iter()
        .map(|s| ScenarioRow {
            name: s.name().to_string(),
            values: s.values().clone(),
        })
        .collect()
}

pub fn equation_rows(network: &Network) -> Vec<EquationRow> {
    network
        .ode()
        .equations()
        .iter()
        .map(|eq| EquationRow {
            component: eq.name.clone(),
            mass_rate: eq.mass_rate.to_string(),
            isotope_rate: eq.isotope_rate.to_string(),
            delta_rate: eq.delta_rate.to_string(),
        })
        .collect()
}

/// ε of every component relative to `reference` (e.g. the substrate).
pub fn fractionation_rows(state: &SteadyState, reference: &str) -> AppResult<Vec<FractionationRow>> {
    if state.component_slot(reference).is_none() {
        return Err(AppError::InvalidInput(format!(
            "Unknown reference component '{reference}'"
        )));
    }
    Ok(state
        .components
        .iter()
        .enumerate()
        .filter_map(|(k, name)| {
            Some(FractionationRow {
                component: name.clone(),
                variable: state.variable[k],
                delta: state.delta[k],
                epsilon: state.fractionation(name, reference)?,
            })
        })
        .collect())
}

/// CSV with one row per recorded point: time, then mass and δ per component.
pub fn trajectory_csv(trajectory: &Trajectory) -> String {
    let mut out = String::from("time");
    for name in &trajectory.components {
        let _ = write!(out, ",{name}_mass,{name}_delta");
    }
    out.push('\n');
    for point in &trajectory.points {
        let _ = write!(out, "{}", point.time);
        for (m, d) in point.mass.iter().zip(&point.delta) {
            let _ = write!(out, ",{m},{d}");
        }
        out.push('\n');
    }
    out
}
