//! Scenario table definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named numeric values for one run.
///
/// Keys follow the formula naming scheme: a parameter name, a component
/// name (its initial pool size) or `component.isotope` (its initial δ).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub name: String,
    /// Scenario whose resolved values this one starts from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl ScenarioDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

/// Scenarios plus table-wide defaults.
///
/// A default applies to every scenario that does not set the key itself;
/// there is no other broadcasting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScenarioTable {
    #[serde(default)]
    pub defaults: BTreeMap<String, f64>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

impl ScenarioTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, key: impl Into<String>, value: f64) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    pub fn with_scenario(mut self, scenario: ScenarioDef) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Scenario names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods() {
        let table = ScenarioTable::new()
            .with_default("eps_CH4", 0.0)
            .with_scenario(ScenarioDef::new("a").set("net", 0.1))
            .with_scenario(ScenarioDef::new("b").base("a").set("f_CO2", 0.7));
        assert_eq!(table.defaults["eps_CH4"], 0.0);
        assert_eq!(table.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(table.scenario("b").unwrap().base.as_deref(), Some("a"));
        assert!(table.scenario("c").is_none());
    }

    #[test]
    fn yaml_shape() {
        let yaml = "
defaults:
  eps_CH4: -83.5
scenarios:
  - name: base
    values:
      net: 0.1
      MeOH.C: -46.2
  - name: more_co2
    base: base
    values:
      f_CO2: 0.85
";
        let table: ScenarioTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.scenarios.len(), 2);
        assert_eq!(table.scenarios[0].values["MeOH.C"], -46.2);
        assert_eq!(table.scenarios[1].base.as_deref(), Some("base"));

        let json = serde_json::to_string(&table).unwrap();
        let back: ScenarioTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
