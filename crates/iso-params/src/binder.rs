//! Binding scenario tables to a compiled network.

use std::collections::{BTreeMap, HashSet};

use iso_network::{EvalContext, Expr, Network, Side, check_weights};
use tracing::{debug, warn};

use crate::error::{BindError, BindResult};
use crate::scenario::{ScenarioDef, ScenarioTable};

/// Name given to the single scenario bound from a table without scenarios.
pub const DEFAULT_SCENARIO: &str = "default";

/// A scenario with every value the network needs, laid out by slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundScenario {
    name: String,
    /// By parameter slot.
    params: Vec<f64>,
    /// By component slot; unreferenced fixed pools default to 0.
    mass: Vec<f64>,
    /// By component slot.
    delta: Vec<f64>,
    /// Every resolved key, including keys the network does not use.
    values: BTreeMap<String, f64>,
    mass_keys: Vec<String>,
    delta_keys: Vec<String>,
}

impl BoundScenario {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    pub fn delta(&self) -> &[f64] {
        &self.delta
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Evaluation context at the scenario's initial state.
    pub fn context(&self) -> EvalContext<'_> {
        EvalContext {
            params: &self.params,
            mass: &self.mass,
            delta: &self.delta,
        }
    }

    /// Same parameters, initial state replaced by `mass` and `delta` (by component slot).
    pub fn with_state(&self, mass: &[f64], delta: &[f64]) -> BoundScenario {
        let mut next = self.clone();
        next.mass.copy_from_slice(mass);
        next.delta.copy_from_slice(delta);
        for (key, v) in next.mass_keys.iter().zip(mass) {
            if let Some(slot) = next.values.get_mut(key) {
                *slot = *v;
            }
        }
        for (key, v) in next.delta_keys.iter().zip(delta) {
            next.values.insert(key.clone(), *v);
        }
        next
    }

    /// Same values under another name.
    pub fn renamed(&self, name: impl Into<String>) -> BoundScenario {
        BoundScenario {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Bound scenarios in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    scenarios: Vec<BoundScenario>,
}

impl Binding {
    pub fn scenarios(&self) -> &[BoundScenario] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> Option<&BoundScenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundScenario> {
        self.scenarios.iter()
    }

    /// Bind a new table on top of this binding.
    ///
    /// A scenario whose `base` is defined in the new table starts from that
    /// base. Otherwise it inherits the resolved values of its `base` in this
    /// binding, the scenario of the same name, or this binding's only
    /// scenario; the new table's defaults then apply on top, and the
    /// scenario's own values win over both.
    pub fn rebind(&self, network: &Network, table: &ScenarioTable) -> BindResult<Binding> {
        bind_with_prior(network, table, Some(self))
    }
}

impl<'a> IntoIterator for &'a Binding {
    type Item = &'a BoundScenario;
    type IntoIter = std::slice::Iter<'a, BoundScenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

/// Bind every scenario of `table` against `network`.
pub fn bind(network: &Network, table: &ScenarioTable) -> BindResult<Binding> {
    bind_with_prior(network, table, None)
}

fn bind_with_prior(
    network: &Network,
    table: &ScenarioTable,
    prior: Option<&Binding>,
) -> BindResult<Binding> {
    let mut seen = HashSet::new();
    for s in &table.scenarios {
        if !seen.insert(s.name.as_str()) {
            return Err(BindError::DuplicateScenario {
                name: s.name.clone(),
            });
        }
    }

    let implicit;
    let defs: &[ScenarioDef] = if table.scenarios.is_empty() {
        implicit = [ScenarioDef::new(DEFAULT_SCENARIO)];
        &implicit
    } else {
        &table.scenarios
    };

    let keys = KeySet::new(network);
    let scenarios = defs
        .iter()
        .map(|def| {
            let values = resolve_values(table, def, prior, &mut Vec::new())?;
            bind_one(network, &keys, &def.name, values)
        })
        .collect::<BindResult<Vec<_>>>()?;

    debug!(scenarios = scenarios.len(), "bound scenario table");
    Ok(Binding { scenarios })
}

/// Precedence, lowest first:
/// - a base defined in `table`: that base's resolved values, then own values;
/// - otherwise: values inherited from `prior`, then `table.defaults`, then own values.
fn resolve_values(
    table: &ScenarioTable,
    def: &ScenarioDef,
    prior: Option<&Binding>,
    stack: &mut Vec<String>,
) -> BindResult<BTreeMap<String, f64>> {
    if stack.contains(&def.name) {
        return Err(BindError::CyclicBase {
            scenario: def.name.clone(),
        });
    }
    stack.push(def.name.clone());

    let mut values = match &def.base {
        Some(base) => match table.scenario(base) {
            Some(base_def) => resolve_values(table, base_def, prior, stack)?,
            None => {
                let inherited = prior.and_then(|p| p.get(base)).ok_or_else(|| {
                    BindError::UnknownScenario {
                        scenario: def.name.clone(),
                        base: base.clone(),
                    }
                })?;
                with_defaults(inherited.values.clone(), table)
            }
        },
        None => match prior.and_then(|p| inherited_by_name(p, &def.name)) {
            Some(inherited) => with_defaults(inherited.values.clone(), table),
            None => table.defaults.clone(),
        },
    };
    values.extend(def.values.iter().map(|(k, v)| (k.clone(), *v)));

    stack.pop();
    Ok(values)
}

/// Same-name scenario of `prior`, or its only scenario.
fn inherited_by_name<'p>(prior: &'p Binding, name: &str) -> Option<&'p BoundScenario> {
    prior
        .get(name)
        .or_else(|| (prior.len() == 1).then(|| &prior.scenarios[0]))
}

fn with_defaults(
    mut inherited: BTreeMap<String, f64>,
    table: &ScenarioTable,
) -> BTreeMap<String, f64> {
    inherited.extend(table.defaults.iter().map(|(k, v)| (k.clone(), *v)));
    inherited
}

/// Every key the network reads, in binding order.
struct KeySet {
    mass: Vec<String>,
    delta: Vec<String>,
    /// Pool sizes that must be given: variable pools and fixed pools read by a formula.
    mass_required: Vec<bool>,
    variable: Vec<bool>,
}

impl KeySet {
    fn new(network: &Network) -> Self {
        let components = network.components();
        Self {
            mass: components.iter().map(|c| c.name.clone()).collect(),
            delta: components.iter().map(|c| network.delta_key(c)).collect(),
            mass_required: components
                .iter()
                .map(|c| c.variable || network.mass_referenced(c.id))
                .collect(),
            variable: components.iter().map(|c| c.variable).collect(),
        }
    }

    fn is_used(&self, network: &Network, key: &str) -> bool {
        network.parameter_slot(key).is_some()
            || self.mass.iter().any(|k| k == key)
            || self.delta.iter().any(|k| k == key)
    }
}

fn bind_one(
    network: &Network,
    keys: &KeySet,
    scenario: &str,
    values: BTreeMap<String, f64>,
) -> BindResult<BoundScenario> {
    let missing = |symbol: &str| BindError::MissingParameter {
        scenario: scenario.to_string(),
        symbol: symbol.to_string(),
    };
    let invalid = |symbol: &str, value: f64, reason| BindError::InvalidValue {
        scenario: scenario.to_string(),
        symbol: symbol.to_string(),
        value,
        reason,
    };

    for (key, value) in &values {
        if !value.is_finite() {
            return Err(invalid(key, *value, "value must be finite"));
        }
    }

    let params = network
        .parameters()
        .iter()
        .map(|p| values.get(p).copied().ok_or_else(|| missing(p)))
        .collect::<BindResult<Vec<_>>>()?;

    let n = keys.mass.len();
    let mut mass = vec![0.0; n];
    let mut delta = vec![0.0; n];
    for k in 0..n {
        match values.get(&keys.mass[k]) {
            Some(&m) if keys.variable[k] && m <= 0.0 => {
                return Err(invalid(&keys.mass[k], m, "variable pool size must be positive"));
            }
            Some(&m) if m < 0.0 => {
                return Err(invalid(&keys.mass[k], m, "pool size must not be negative"));
            }
            Some(&m) => mass[k] = m,
            None if keys.mass_required[k] => return Err(missing(&keys.mass[k])),
            None => {}
        }
        delta[k] = values
            .get(&keys.delta[k])
            .copied()
            .ok_or_else(|| missing(&keys.delta[k]))?;
    }

    check_parametric_weights(network, scenario, &params)?;

    for key in values.keys().filter(|k| !keys.is_used(network, k)) {
        warn!(scenario, key = key.as_str(), "scenario value is not used by the network");
    }

    Ok(BoundScenario {
        name: scenario.to_string(),
        params,
        mass,
        delta,
        values,
        mass_keys: keys.mass.clone(),
        delta_keys: keys.delta.clone(),
    })
}

fn check_parametric_weights(network: &Network, scenario: &str, params: &[f64]) -> BindResult<()> {
    let ctx = EvalContext {
        params,
        mass: &[],
        delta: &[],
    };
    for reaction in network.reactions() {
        for side in [Side::Source, Side::Destination] {
            let endpoints = reaction.endpoints(side);
            if endpoints
                .iter()
                .all(|e| matches!(e.weight.simplified(), Expr::Const(_)))
            {
                continue;
            }
            let mut weights = Vec::with_capacity(endpoints.len());
            for e in endpoints {
                weights.push(network.resolve(&reaction.label, &e.weight)?.eval(&ctx));
            }
            check_weights(&weights).map_err(|reason| BindError::InvalidWeights {
                scenario: scenario.to_string(),
                reaction: reaction.label.clone(),
                reason,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_network::{NetworkBuilder, ReactionDef};

    fn network() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_isotope("C");
        b.add_fixed("MeOH");
        b.add_variable("CH4");
        b.add_fixed("CH4_out");
        b.add_reaction(
            ReactionDef::new("methanogenesis", Expr::sym("net"))
                .from("MeOH")
                .to("CH4")
                .isotope(Expr::delta("MeOH", "C") + Expr::sym("eps")),
        );
        b.add_reaction(
            ReactionDef::new("export", Expr::sym("net"))
                .from("CH4")
                .to("CH4_out"),
        );
        b.compile().unwrap()
    }

    fn complete() -> ScenarioDef {
        ScenarioDef::new("s")
            .set("net", 0.1)
            .set("eps", -80.0)
            .set("CH4", 10.0)
            .set("MeOH.C", -46.2)
            .set("CH4.C", 0.0)
            .set("CH4_out.C", 0.0)
    }

    #[test]
    fn binds_values_by_slot() {
        let net = network();
        let table = ScenarioTable::new().with_scenario(complete());
        let binding = bind(&net, &table).unwrap();
        let s = binding.get("s").unwrap();
        assert_eq!(s.params(), [-80.0, 0.1]);
        assert_eq!(s.mass(), [0.0, 10.0, 0.0]);
        assert_eq!(s.delta(), [-46.2, 0.0, 0.0]);
    }

    #[test]
    fn missing_symbol_is_named() {
        let net = network();
        let mut def = complete();
        def.values.remove("eps");
        let err = bind(&net, &ScenarioTable::new().with_scenario(def)).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingParameter {
                scenario: "s".into(),
                symbol: "eps".into()
            }
        );

        let mut def = complete();
        def.values.remove("CH4_out.C");
        let err = bind(&net, &ScenarioTable::new().with_scenario(def)).unwrap_err();
        assert!(matches!(err, BindError::MissingParameter { symbol, .. } if symbol == "CH4_out.C"));
    }

    #[test]
    fn defaults_fill_gaps_but_do_not_override() {
        let net = network();
        let mut def = complete();
        def.values.remove("eps");
        let table = ScenarioTable::new()
            .with_default("eps", -10.0)
            .with_default("net", 5.0)
            .with_scenario(def);
        let s = bind(&net, &table).unwrap().scenarios()[0].clone();
        assert_eq!(s.value("eps"), Some(-10.0));
        assert_eq!(s.value("net"), Some(0.1));
    }

    #[test]
    fn rejects_invalid_values() {
        let net = network();
        let table = ScenarioTable::new().with_scenario(complete().set("CH4", 0.0));
        assert!(matches!(
            bind(&net, &table),
            Err(BindError::InvalidValue { .. })
        ));
        let table = ScenarioTable::new().with_scenario(complete().set("net", f64::NAN));
        assert!(matches!(
            bind(&net, &table),
            Err(BindError::InvalidValue { .. })
        ));
    }

    #[test]
    fn duplicate_and_unknown_scenarios() {
        let net = network();
        let table = ScenarioTable::new()
            .with_scenario(complete())
            .with_scenario(complete());
        assert!(matches!(
            bind(&net, &table),
            Err(BindError::DuplicateScenario { .. })
        ));

        let table = ScenarioTable::new().with_scenario(complete().base("nope"));
        assert!(matches!(
            bind(&net, &table),
            Err(BindError::UnknownScenario { .. })
        ));

        let table = ScenarioTable::new().with_scenario(complete().base("s"));
        assert!(matches!(bind(&net, &table), Err(BindError::CyclicBase { .. })));
    }

    #[test]
    fn base_inheritance_within_table() {
        let net = network();
        let table = ScenarioTable::new()
            .with_scenario(complete())
            .with_scenario(ScenarioDef::new("t").base("s").set("eps", -20.0));
        let binding = bind(&net, &table).unwrap();
        let t = binding.get("t").unwrap();
        assert_eq!(t.value("eps"), Some(-20.0));
        assert_eq!(t.value("net"), Some(0.1));
    }

    #[test]
    fn empty_table_binds_defaults() {
        let net = network();
        let table = ScenarioTable {
            defaults: complete().values,
            scenarios: Vec::new(),
        };
        let binding = bind(&net, &table).unwrap();
        assert_eq!(binding.len(), 1);
        assert_eq!(binding.scenarios()[0].name(), DEFAULT_SCENARIO);
    }

    #[test]
    fn with_state_replaces_initial_conditions() {
        let net = network();
        let binding = bind(&net, &ScenarioTable::new().with_scenario(complete())).unwrap();
        let s = &binding.scenarios()[0];
        let warm = s.with_state(&[0.0, 4.0, 0.0], &[-46.2, -120.0, 0.0]);
        assert_eq!(warm.mass()[1], 4.0);
        assert_eq!(warm.delta()[1], -120.0);
        assert_eq!(warm.value("CH4"), Some(4.0));
        assert_eq!(warm.value("CH4.C"), Some(-120.0));
        assert_eq!(warm.params(), s.params());
        assert_eq!(s.renamed("x").name(), "x");
    }
}
