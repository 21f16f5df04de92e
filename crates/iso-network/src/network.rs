//! The compiled, immutable reaction network.

use iso_core::{ComponentId, ReactionId};

use crate::compile::{OdeSystem, Rates, ReactionEvaluation};
use crate::error::NetworkResult;
use crate::expr::Expr;
use crate::model::{Component, Isotope, Reaction};
use crate::resolve::{EvalContext, Resolved};
use crate::validate::SymbolTable;

/// A validated reaction network together with its ODE system.
///
/// Built once by `NetworkBuilder::compile` and only read afterwards, so it can
/// be shared across threads evaluating different scenarios.
#[derive(Debug, Clone)]
pub struct Network {
    isotope: Isotope,
    components: Vec<Component>,
    reactions: Vec<Reaction>,
    symbols: SymbolTable,
    ode: OdeSystem,
}

impl Network {
    pub(crate) fn new(
        isotope: Isotope,
        components: Vec<Component>,
        reactions: Vec<Reaction>,
        symbols: SymbolTable,
        ode: OdeSystem,
    ) -> Self {
        Self {
            isotope,
            components,
            reactions,
            symbols,
            ode,
        }
    }

    pub fn isotope(&self) -> &Isotope {
        &self.isotope
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.slot())
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.symbols
            .component(name)
            .and_then(|id| self.component(id))
    }

    pub fn variable_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.variable)
    }

    pub fn fixed_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| !c.variable)
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.get(id.slot())
    }

    pub fn reaction_by_label(&self, label: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.label == label)
    }

    /// Parameter names referenced by any formula, sorted.
    pub fn parameters(&self) -> &[String] {
        self.symbols.parameters()
    }

    pub fn parameter_slot(&self, name: &str) -> Option<usize> {
        self.symbols.parameter_slot(name)
    }

    /// True when some formula reads the pool size of `id`.
    pub fn mass_referenced(&self, id: ComponentId) -> bool {
        self.symbols.mass_referenced(id)
    }

    /// The δ symbol of a component, e.g. `CH4.C`.
    pub fn delta_key(&self, component: &Component) -> String {
        Expr::delta(&component.name, &self.isotope.name).to_string()
    }

    pub fn ode(&self) -> &OdeSystem {
        &self.ode
    }

    pub fn rates(&self, ctx: &EvalContext<'_>) -> Rates {
        self.ode.rates(ctx)
    }

    pub fn evaluate_reaction(
        &self,
        id: ReactionId,
        ctx: &EvalContext<'_>,
    ) -> Option<ReactionEvaluation> {
        self.ode.evaluate_reaction(id, ctx)
    }

    /// Resolve an ad-hoc formula (e.g. a weight or a query column) against this network.
    pub fn resolve(&self, context: &str, expr: &Expr) -> NetworkResult<Resolved> {
        Resolved::from_expr(expr, &|s| self.symbols.lookup(context, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NetworkBuilder, ReactionDef};

    fn chain() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_isotope("C");
        b.add_fixed("MeOH");
        b.add_variable("CH4");
        b.add_fixed("CH4_out");
        b.add_reaction(
            ReactionDef::new("methanogenesis", Expr::sym("net"))
                .from("MeOH")
                .to("CH4")
                .isotope(Expr::delta("MeOH", "C") + Expr::sym("eps"))
                .abscissa(1.0),
        );
        b.add_reaction(
            ReactionDef::new("export", Expr::sym("k") * Expr::sym("CH4"))
                .from("CH4")
                .to("CH4_out"),
        );
        b.compile().unwrap()
    }

    #[test]
    fn lookups() {
        let net = chain();
        assert_eq!(net.isotope().name, "C");
        assert_eq!(net.component_by_name("CH4").unwrap().id.index(), 1);
        assert!(net.component_by_name("CO2").is_none());
        assert_eq!(net.variable_components().count(), 1);
        assert_eq!(net.fixed_components().count(), 2);
        assert_eq!(net.parameters(), ["eps", "k", "net"]);
        assert_eq!(net.parameter_slot("k"), Some(1));
        assert_eq!(net.parameter_slot("CH4"), None);
        assert!(net.mass_referenced(ComponentId::from_index(1)));
        assert!(!net.mass_referenced(ComponentId::from_index(0)));
        assert_eq!(net.delta_key(&net.components()[1]), "CH4.C");
        assert_eq!(net.reaction_by_label("export").unwrap().id.index(), 1);
    }

    #[test]
    fn symbolic_balance() {
        let net = chain();
        let eq = &net.ode().equations()[0];
        assert_eq!(eq.name, "CH4");
        assert_eq!(eq.mass_rate.to_string(), "net - k * CH4");
        assert_eq!(eq.isotope_rate.to_string(), "net * (MeOH.C + eps) - k * CH4 * CH4.C");
    }

    #[test]
    fn numeric_rates_and_exchange() {
        let net = chain();
        // params sorted: eps, k, net
        let ctx = EvalContext {
            params: &[-10.0, 0.01, 0.1],
            mass: &[0.0, 10.0, 0.0],
            delta: &[-46.2, -60.0, 0.0],
        };
        let rates = net.rates(&ctx);
        assert!((rates.mass[1] - (0.1 - 0.1)).abs() < 1e-12);
        // d(Mδ)/dt = 0.1*(-56.2) - 0.1*(-60) = 0.38, dδ/dt = (0.38 - (-60)*0)/10
        assert!((rates.delta[1] - 0.038).abs() < 1e-12);
        assert!((rates.exchange[0] + 0.1).abs() < 1e-12);
        assert!((rates.exchange[2] - 0.1).abs() < 1e-12);
        assert_eq!(rates.exchange[1], 0.0);

        let eval = net.evaluate_reaction(ReactionId::from_index(0), &ctx).unwrap();
        assert!((eval.flux - 0.1).abs() < 1e-12);
        assert!((eval.destinations[0].delta + 56.2).abs() < 1e-12);
    }

    #[test]
    fn network_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Network>();
    }
}
