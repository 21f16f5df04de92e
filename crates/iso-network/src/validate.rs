//! Network validation and symbol classification.

use std::collections::{BTreeSet, HashMap, HashSet};

use iso_core::{ComponentId, ReactionId};

use crate::builder::{ComponentDecl, EndpointDef, ReactionDef};
use crate::error::{ConfigurationError, NetworkResult};
use crate::expr::Expr;
use crate::model::{Component, Endpoint, Isotope, Reaction, Side};
use crate::resolve::SymbolRef;

/// Tolerance on the sum of constant endpoint weights.
pub(crate) const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub(crate) fn validate_isotopes(isotopes: &[String]) -> NetworkResult<Isotope> {
    match isotopes {
        [name] => {
            check_name("isotope", name)?;
            Ok(Isotope { name: name.clone() })
        }
        _ => Err(ConfigurationError::IsotopeCount {
            count: isotopes.len(),
        }),
    }
}

pub(crate) fn validate_components(decls: &[ComponentDecl]) -> NetworkResult<Vec<Component>> {
    let mut seen = HashSet::new();
    for decl in decls {
        check_name("component", &decl.name)?;
        if !seen.insert(decl.name.as_str()) {
            return Err(ConfigurationError::DuplicateName {
                kind: "component",
                name: decl.name.clone(),
            });
        }
    }
    Ok(decls
        .iter()
        .map(|d| Component {
            id: d.id,
            name: d.name.clone(),
            variable: d.variable,
        })
        .collect())
}

pub(crate) fn validate_labels(reactions: &[Reaction]) -> NetworkResult<()> {
    let mut seen = HashSet::new();
    for r in reactions {
        if !seen.insert(r.label.as_str()) {
            return Err(ConfigurationError::DuplicateName {
                kind: "reaction",
                name: r.label.clone(),
            });
        }
    }
    Ok(())
}

/// Names are plain identifiers: a leading letter or underscore, then letters, digits or underscores.
fn check_name(kind: &'static str, name: &str) -> NetworkResult<()> {
    let invalid = |reason| ConfigurationError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    };
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or '_'"));
        }
        _ => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Err(invalid("only letters, digits and '_' are allowed"));
    }
    Ok(())
}

pub(crate) fn validate_reaction(
    id: ReactionId,
    def: ReactionDef,
    symbols: &SymbolTable,
) -> NetworkResult<Reaction> {
    if def.label.trim().is_empty() {
        return Err(ConfigurationError::InvalidName {
            kind: "reaction",
            name: def.label,
            reason: "label is empty",
        });
    }
    let sources = validate_side(&def.label, Side::Source, def.sources, symbols)?;
    let destinations = validate_side(&def.label, Side::Destination, def.destinations, symbols)?;

    Ok(Reaction {
        id,
        label: def.label,
        flux: def.flux,
        isotope: def.isotope,
        sources,
        destinations,
        abscissa: def.abscissa,
    })
}

fn validate_side(
    reaction: &str,
    side: Side,
    defs: Vec<EndpointDef>,
    symbols: &SymbolTable,
) -> NetworkResult<Vec<Endpoint>> {
    if defs.is_empty() {
        return Err(ConfigurationError::EmptySide {
            reaction: reaction.to_string(),
            side,
        });
    }
    let count = defs.len();
    if count > 1 && defs.iter().any(|d| d.weight.is_none()) {
        return Err(ConfigurationError::AmbiguousRouting {
            reaction: reaction.to_string(),
            side,
            count,
        });
    }

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(count);
    for def in defs {
        let component = symbols.component(&def.component).ok_or_else(|| {
            ConfigurationError::DanglingComponent {
                reaction: reaction.to_string(),
                component: def.component.clone(),
            }
        })?;
        if !seen.insert(component) {
            return Err(ConfigurationError::DuplicateEndpoint {
                reaction: reaction.to_string(),
                component: def.component,
                side,
            });
        }
        endpoints.push(Endpoint {
            component,
            weight: def.weight.unwrap_or(Expr::Const(1.0)),
            isotope: def.isotope,
        });
    }

    let constants: Option<Vec<f64>> = endpoints
        .iter()
        .map(|e| match e.weight.simplified() {
            Expr::Const(v) => Some(v),
            _ => None,
        })
        .collect();
    if let Some(weights) = constants {
        check_weights(&weights).map_err(|reason| ConfigurationError::InvalidWeights {
            reaction: reaction.to_string(),
            side,
            reason,
        })?;
    }

    Ok(endpoints)
}

/// Weights on one side must be positive, finite and sum to one.
pub fn check_weights(weights: &[f64]) -> Result<(), String> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(format!("weight {w} is not a positive finite number"));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(format!("weights sum to {total}, expected 1"));
    }
    Ok(())
}

/// How a symbol is interpreted inside a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Param(String),
    Mass(ComponentId),
    Delta(ComponentId),
}

/// Component names, the declared isotope and the parameters discovered in reactions.
#[derive(Debug, Clone)]
pub(crate) struct SymbolTable {
    components: HashMap<String, ComponentId>,
    isotope: String,
    parameters: Vec<String>,
    referenced_masses: Vec<bool>,
}

impl SymbolTable {
    pub(crate) fn new(components: &[Component], isotope: &Isotope) -> Self {
        Self {
            components: components.iter().map(|c| (c.name.clone(), c.id)).collect(),
            isotope: isotope.name.clone(),
            parameters: Vec::new(),
            referenced_masses: vec![false; components.len()],
        }
    }

    pub(crate) fn component(&self, name: &str) -> Option<ComponentId> {
        self.components.get(name).copied()
    }

    pub(crate) fn classify(&self, reaction: &str, symbol: &str) -> NetworkResult<SymbolKind> {
        let Some((component, isotope)) = symbol.split_once('.') else {
            return Ok(match self.component(symbol) {
                Some(id) => SymbolKind::Mass(id),
                None => SymbolKind::Param(symbol.to_string()),
            });
        };
        if component.is_empty() || isotope.is_empty() || isotope.contains('.') {
            return Err(ConfigurationError::InvalidSymbol {
                reaction: reaction.to_string(),
                symbol: symbol.to_string(),
            });
        }
        let id = self
            .component(component)
            .ok_or_else(|| ConfigurationError::DanglingComponent {
                reaction: reaction.to_string(),
                component: component.to_string(),
            })?;
        if isotope != self.isotope {
            return Err(ConfigurationError::UndeclaredIsotope {
                reaction: reaction.to_string(),
                symbol: symbol.to_string(),
                isotope: isotope.to_string(),
                declared: self.isotope.clone(),
            });
        }
        Ok(SymbolKind::Delta(id))
    }

    /// Classify every symbol of every reaction and record parameters and referenced pool sizes.
    pub(crate) fn register(&mut self, reactions: &[Reaction]) -> NetworkResult<()> {
        let mut parameters = BTreeSet::new();
        for r in reactions {
            let mut formulas: Vec<&Expr> = vec![&r.flux];
            formulas.extend(r.isotope.as_ref());
            for e in r.sources.iter().chain(&r.destinations) {
                formulas.extend(e.isotope.as_ref());
            }
            for formula in formulas {
                for symbol in formula.symbols() {
                    match self.classify(&r.label, &symbol)? {
                        SymbolKind::Param(name) => {
                            parameters.insert(name);
                        }
                        SymbolKind::Mass(id) => self.referenced_masses[id.slot()] = true,
                        SymbolKind::Delta(_) => {}
                    }
                }
            }

            // weights split flux between pools and may only depend on parameters
            for e in r.sources.iter().chain(&r.destinations) {
                for symbol in e.weight.symbols() {
                    match self.classify(&r.label, &symbol)? {
                        SymbolKind::Param(name) => {
                            parameters.insert(name);
                        }
                        _ => {
                            return Err(ConfigurationError::InvalidSymbol {
                                reaction: r.label.clone(),
                                symbol,
                            });
                        }
                    }
                }
            }
        }
        self.parameters = parameters.into_iter().collect();
        Ok(())
    }

    pub(crate) fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub(crate) fn parameter_slot(&self, name: &str) -> Option<usize> {
        self.parameters
            .binary_search_by(|p| p.as_str().cmp(name))
            .ok()
    }

    pub(crate) fn mass_referenced(&self, id: ComponentId) -> bool {
        self.referenced_masses.get(id.slot()).copied().unwrap_or(false)
    }

    /// Resolve a symbol to its evaluation slot.
    pub(crate) fn lookup(&self, reaction: &str, symbol: &str) -> NetworkResult<SymbolRef> {
        match self.classify(reaction, symbol)? {
            SymbolKind::Mass(id) => Ok(SymbolRef::Mass(id.slot())),
            SymbolKind::Delta(id) => Ok(SymbolRef::Delta(id.slot())),
            SymbolKind::Param(name) => self.parameter_slot(&name).map(SymbolRef::Param).ok_or(
                ConfigurationError::InvalidSymbol {
                    reaction: reaction.to_string(),
                    symbol: name,
                },
            ),
        }
    }
}
