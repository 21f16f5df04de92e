//! Project schema definitions.

use iso_params::ScenarioTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    /// Tracer carried by every component, e.g. `C`.
    pub isotope: String,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub reactions: Vec<ReactionDef>,
    #[serde(default)]
    pub scenarios: ScenarioTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub kind: PoolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Fixed,
    Variable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionDef {
    pub label: String,
    /// Net flux formula.
    pub flux: String,
    pub from: Vec<EndpointDef>,
    pub to: Vec<EndpointDef>,
    /// Shared isotope formula for every endpoint without its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isotope: Option<String>,
    /// Position along the diagram's horizontal axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abscissa: Option<f64>,
}

/// A bare component name, or a component with routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EndpointDef {
    Name(String),
    Detailed {
        component: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<WeightDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        isotope: Option<String>,
    },
}

impl EndpointDef {
    pub fn component(&self) -> &str {
        match self {
            EndpointDef::Name(name) => name,
            EndpointDef::Detailed { component, .. } => component,
        }
    }
}

/// Flux share of an endpoint: a number or a formula over parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WeightDef {
    Value(f64),
    Formula(String),
}

impl Project {
    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn reaction(&self, label: &str) -> Option<&ReactionDef> {
        self.reactions.iter().find(|r| r.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_accept_names_and_details() {
        let yaml = "
label: carbonylation
flux: 2*net*f_lipid
from:
  - component: CH3X
    weight: 0.5
    isotope: CH3X.C + eps_methyl
  - component: CO2
    weight: 0.5
to: [AcCoA]
";
        let r: ReactionDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(r.from.len(), 2);
        assert_eq!(r.from[1].component(), "CO2");
        assert_eq!(r.to, vec![EndpointDef::Name("AcCoA".into())]);
        match &r.from[0] {
            EndpointDef::Detailed {
                weight, isotope, ..
            } => {
                assert_eq!(weight, &Some(WeightDef::Value(0.5)));
                assert_eq!(isotope.as_deref(), Some("CH3X.C + eps_methyl"));
            }
            other => panic!("unexpected endpoint {other:?}"),
        }
    }

    #[test]
    fn formula_weights() {
        let e: EndpointDef =
            serde_yaml::from_str("{component: biomass, weight: 1 - f_lip_ac}").unwrap();
        assert!(matches!(
            e,
            EndpointDef::Detailed { weight: Some(WeightDef::Formula(ref f)), .. } if f == "1 - f_lip_ac"
        ));
    }
}
