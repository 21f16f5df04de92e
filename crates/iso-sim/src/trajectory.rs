//! Recorded time courses.

use serde::{Deserialize, Serialize};

use iso_network::Network;

use crate::isotope_model::PoolState;

/// One recorded state; vectors are indexed by component slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub mass: Vec<f64>,
    pub delta: Vec<f64>,
    /// Cumulative mass received by each fixed component since t = 0.
    pub exchange: Vec<f64>,
}

impl TrajectoryPoint {
    pub fn from_state(time: f64, state: &PoolState) -> Self {
        Self {
            time,
            mass: state.mass.clone(),
            delta: state.delta.clone(),
            exchange: state.exchange.clone(),
        }
    }
}

/// Time course of one scenario, with strictly increasing times starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub scenario: String,
    pub components: Vec<String>,
    pub variable: Vec<bool>,
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(network: &Network, scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            components: network.components().iter().map(|c| c.name.clone()).collect(),
            variable: network.components().iter().map(|c| c.variable).collect(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn component_slot(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }

    /// `(time, mass)` pairs of one component.
    pub fn mass_series(&self, component: &str) -> Option<Vec<(f64, f64)>> {
        let k = self.component_slot(component)?;
        Some(self.points.iter().map(|p| (p.time, p.mass[k])).collect())
    }

    /// `(time, δ)` pairs of one component.
    pub fn delta_series(&self, component: &str) -> Option<Vec<(f64, f64)>> {
        let k = self.component_slot(component)?;
        Some(self.points.iter().map(|p| (p.time, p.delta[k])).collect())
    }

    /// Total variable-pool mass plus cumulative exchange at one point.
    ///
    /// Constant along an exact solution; equals the initial variable mass.
    pub fn carbon_inventory(&self, point: &TrajectoryPoint) -> f64 {
        let pools: f64 = point
            .mass
            .iter()
            .zip(&self.variable)
            .filter(|(_, variable)| **variable)
            .map(|(m, _)| m)
            .sum();
        pools + point.exchange.iter().sum::<f64>()
    }

    /// Largest drift of `carbon_inventory` from its initial value.
    pub fn mass_balance_error(&self) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        let initial = self.carbon_inventory(first);
        self.points
            .iter()
            .map(|p| (self.carbon_inventory(p) - initial).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory() -> Trajectory {
        Trajectory {
            scenario: "s".into(),
            components: vec!["MeOH".into(), "CH4".into(), "CH4_out".into()],
            variable: vec![false, true, false],
            points: vec![
                TrajectoryPoint {
                    time: 0.0,
                    mass: vec![0.0, 10.0, 0.0],
                    delta: vec![-46.2, 0.0, 0.0],
                    exchange: vec![0.0, 0.0, 0.0],
                },
                TrajectoryPoint {
                    time: 1.0,
                    mass: vec![0.0, 10.5, 0.0],
                    delta: vec![-46.2, -3.0, 0.0],
                    exchange: vec![-1.0, 0.0, 0.5],
                },
            ],
        }
    }

    #[test]
    fn series_and_inventory() {
        let t = trajectory();
        assert_eq!(t.times(), vec![0.0, 1.0]);
        assert_eq!(t.delta_series("CH4").unwrap(), vec![(0.0, 0.0), (1.0, -3.0)]);
        assert!(t.mass_series("CO2").is_none());
        assert_eq!(t.carbon_inventory(&t.points[1]), 10.0);
        assert_eq!(t.mass_balance_error(), 0.0);
    }

    #[test]
    fn json_round_trip() {
        let t = trajectory();
        let json = serde_json::to_string(&t).unwrap();
        let back: Trajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
