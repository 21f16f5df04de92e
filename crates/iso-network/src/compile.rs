//! Network compiler: mass and isotope balances for every variable component.

use std::fmt;

use iso_core::{ComponentId, ReactionId};

use crate::error::{ConfigurationError, NetworkResult};
use crate::expr::Expr;
use crate::model::{Component, Endpoint, Isotope, Reaction};
use crate::resolve::{EvalContext, Resolved};
use crate::validate::SymbolTable;

/// An endpoint with its effective weight and isotope formula resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEndpoint {
    pub component: ComponentId,
    pub weight: Resolved,
    pub isotope: Resolved,
    /// Effective δ formula after routing defaults were applied.
    pub isotope_expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledReaction {
    pub id: ReactionId,
    pub flux: Resolved,
    pub sources: Vec<CompiledEndpoint>,
    pub destinations: Vec<CompiledEndpoint>,
}

/// Symbolic balances of one variable component.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEquation {
    pub component: ComponentId,
    pub name: String,
    /// `component.isotope`, the δ symbol of this component.
    pub delta_symbol: String,
    /// dM/dt
    pub mass_rate: Expr,
    /// d(M·δ)/dt
    pub isotope_rate: Expr,
    /// dδ/dt by the quotient rule.
    pub delta_rate: Expr,
}

impl fmt::Display for BalanceEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "d{}/dt = {}", self.name, self.mass_rate)?;
        writeln!(
            f,
            "d({}*{})/dt = {}",
            self.name, self.delta_symbol, self.isotope_rate
        )?;
        write!(f, "d{}/dt = {}", self.delta_symbol, self.delta_rate)
    }
}

/// Time derivatives at one state, indexed by component slot.
///
/// `mass` and `delta` are zero for fixed components. `exchange` is the net
/// mass flux into each fixed component (negative for sources) and zero for
/// variable ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rates {
    pub mass: Vec<f64>,
    pub delta: Vec<f64>,
    pub exchange: Vec<f64>,
}

/// Mass flux and δ moved through one endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointFlow {
    pub component: ComponentId,
    pub mass_flux: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEvaluation {
    pub reaction: ReactionId,
    pub flux: f64,
    pub sources: Vec<EndpointFlow>,
    pub destinations: Vec<EndpointFlow>,
}

impl ReactionEvaluation {
    /// Flux-weighted mean δ of the carbon leaving the sources.
    ///
    /// `None` when nothing flows through the reaction.
    pub fn source_delta(&self) -> Option<f64> {
        weighted_delta(&self.sources)
    }

    /// Flux-weighted mean δ of the carbon arriving at the destinations.
    ///
    /// `None` when nothing flows through the reaction.
    pub fn destination_delta(&self) -> Option<f64> {
        weighted_delta(&self.destinations)
    }
}

fn weighted_delta(flows: &[EndpointFlow]) -> Option<f64> {
    let total: f64 = flows.iter().map(|f| f.mass_flux).sum();
    if total == 0.0 || !total.is_finite() {
        return None;
    }
    Some(flows.iter().map(|f| f.mass_flux * f.delta).sum::<f64>() / total)
}

/// Compiled ODE system of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeSystem {
    variable: Vec<bool>,
    reactions: Vec<CompiledReaction>,
    equations: Vec<BalanceEquation>,
}

impl OdeSystem {
    pub(crate) fn build(
        isotope: &Isotope,
        components: &[Component],
        reactions: &[Reaction],
        symbols: &SymbolTable,
    ) -> NetworkResult<Self> {
        let delta_of = |id: ComponentId| Expr::delta(&components[id.slot()].name, &isotope.name);

        let mut compiled = Vec::with_capacity(reactions.len());
        // (component, mass flow, isotope flow, inflow) per endpoint
        let mut terms: Vec<(ComponentId, Expr, Expr, bool)> = Vec::new();

        for r in reactions {
            let resolve = |e: &Expr| Resolved::from_expr(e, &|s| symbols.lookup(&r.label, s));

            let source_isotopes: Vec<Expr> = r
                .sources
                .iter()
                .map(|e| effective(e, r).unwrap_or_else(|| delta_of(e.component)))
                .collect();
            let blend = Expr::sum(
                r.sources
                    .iter()
                    .zip(&source_isotopes)
                    .map(|(e, iso)| e.weight.clone() * iso.clone()),
            )
            .simplified();
            let destination_isotopes: Vec<Expr> = r
                .destinations
                .iter()
                .map(|e| effective(e, r).unwrap_or_else(|| blend.clone()))
                .collect();

            let mut compile_side = |endpoints: &[Endpoint], isotopes: Vec<Expr>, inflow: bool| {
                endpoints
                    .iter()
                    .zip(isotopes)
                    .map(|(e, iso)| {
                        let flow = (e.weight.clone() * r.flux.clone()).simplified();
                        terms.push((e.component, flow.clone(), flow * iso.clone(), inflow));
                        Ok::<_, ConfigurationError>(CompiledEndpoint {
                            component: e.component,
                            weight: resolve(&e.weight)?,
                            isotope: resolve(&iso)?,
                            isotope_expr: iso,
                        })
                    })
                    .collect::<NetworkResult<Vec<_>>>()
            };
            let sources = compile_side(&r.sources, source_isotopes, false)?;
            let destinations = compile_side(&r.destinations, destination_isotopes, true)?;

            compiled.push(CompiledReaction {
                id: r.id,
                flux: resolve(&r.flux)?,
                sources,
                destinations,
            });
        }

        let equations = components
            .iter()
            .filter(|c| c.variable)
            .map(|c| {
                let side = |inflow: bool, isotope: bool| {
                    Expr::sum(terms.iter().filter(|t| t.0 == c.id && t.3 == inflow).map(|t| {
                        if isotope { t.2.clone() } else { t.1.clone() }
                    }))
                };
                let mass_rate = (side(true, false) - side(false, false)).simplified();
                let isotope_rate = (side(true, true) - side(false, true)).simplified();
                let delta = delta_of(c.id);
                let delta_rate = ((isotope_rate.clone() - delta.clone() * mass_rate.clone())
                    / Expr::sym(c.name.clone()))
                .simplified();
                BalanceEquation {
                    component: c.id,
                    name: c.name.clone(),
                    delta_symbol: delta.to_string(),
                    mass_rate,
                    isotope_rate,
                    delta_rate,
                }
            })
            .collect();

        Ok(Self {
            variable: components.iter().map(|c| c.variable).collect(),
            reactions: compiled,
            equations,
        })
    }

    /// One balance per variable component, in declaration order.
    pub fn equations(&self) -> &[BalanceEquation] {
        &self.equations
    }

    pub fn equation(&self, component: ComponentId) -> Option<&BalanceEquation> {
        self.equations.iter().find(|e| e.component == component)
    }

    pub fn reactions(&self) -> &[CompiledReaction] {
        &self.reactions
    }

    pub fn component_count(&self) -> usize {
        self.variable.len()
    }

    /// Evaluate every balance at the state in `ctx`.
    pub fn rates(&self, ctx: &EvalContext<'_>) -> Rates {
        let n = self.variable.len();
        let mut dm = vec![0.0; n];
        let mut dmd = vec![0.0; n];

        for r in &self.reactions {
            let flux = r.flux.eval(ctx);
            for e in &r.sources {
                let flow = e.weight.eval(ctx) * flux;
                dm[e.component.slot()] -= flow;
                dmd[e.component.slot()] -= flow * e.isotope.eval(ctx);
            }
            for e in &r.destinations {
                let flow = e.weight.eval(ctx) * flux;
                dm[e.component.slot()] += flow;
                dmd[e.component.slot()] += flow * e.isotope.eval(ctx);
            }
        }

        let mut rates = Rates {
            mass: vec![0.0; n],
            delta: vec![0.0; n],
            exchange: vec![0.0; n],
        };
        for k in 0..n {
            if self.variable[k] {
                rates.mass[k] = dm[k];
                rates.delta[k] = (dmd[k] - ctx.delta[k] * dm[k]) / ctx.mass[k];
            } else {
                rates.exchange[k] = dm[k];
            }
        }
        rates
    }

    pub fn evaluate_reaction(
        &self,
        id: ReactionId,
        ctx: &EvalContext<'_>,
    ) -> Option<ReactionEvaluation> {
        let r = self.reactions.get(id.slot())?;
        let flux = r.flux.eval(ctx);
        let flows = |endpoints: &[CompiledEndpoint]| {
            endpoints
                .iter()
                .map(|e| EndpointFlow {
                    component: e.component,
                    mass_flux: e.weight.eval(ctx) * flux,
                    delta: e.isotope.eval(ctx),
                })
                .collect()
        };
        Some(ReactionEvaluation {
            reaction: r.id,
            flux,
            sources: flows(&r.sources),
            destinations: flows(&r.destinations),
        })
    }
}

/// Endpoint formula, else the reaction's shared formula.
fn effective(endpoint: &Endpoint, reaction: &Reaction) -> Option<Expr> {
    endpoint
        .isotope
        .clone()
        .or_else(|| reaction.isotope.clone())
}
