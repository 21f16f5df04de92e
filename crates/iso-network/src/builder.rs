//! Incremental network builder.

use iso_core::{ComponentId, ReactionId};

use crate::compile::OdeSystem;
use crate::error::NetworkResult;
use crate::expr::Expr;
use crate::network::Network;
use crate::validate::{self, SymbolTable};

/// One end of a reaction, addressed by component name.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDef {
    pub component: String,
    /// Carbon share of the reaction flux; required when a side has several endpoints.
    pub weight: Option<Expr>,
    /// δ of the carbon moved through this endpoint.
    pub isotope: Option<Expr>,
}

impl EndpointDef {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            weight: None,
            isotope: None,
        }
    }

    pub fn weight(mut self, weight: impl Into<Expr>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn isotope(mut self, isotope: impl Into<Expr>) -> Self {
        self.isotope = Some(isotope.into());
        self
    }
}

/// Declaration of a reaction before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionDef {
    pub label: String,
    pub flux: Expr,
    pub isotope: Option<Expr>,
    pub sources: Vec<EndpointDef>,
    pub destinations: Vec<EndpointDef>,
    pub abscissa: Option<f64>,
}

impl ReactionDef {
    pub fn new(label: impl Into<String>, flux: impl Into<Expr>) -> Self {
        Self {
            label: label.into(),
            flux: flux.into(),
            isotope: None,
            sources: Vec::new(),
            destinations: Vec::new(),
            abscissa: None,
        }
    }

    pub fn from(self, component: impl Into<String>) -> Self {
        self.from_endpoint(EndpointDef::new(component))
    }

    pub fn to(self, component: impl Into<String>) -> Self {
        self.to_endpoint(EndpointDef::new(component))
    }

    pub fn from_endpoint(mut self, endpoint: EndpointDef) -> Self {
        self.sources.push(endpoint);
        self
    }

    pub fn to_endpoint(mut self, endpoint: EndpointDef) -> Self {
        self.destinations.push(endpoint);
        self
    }

    /// δ shared by every endpoint without its own expression.
    pub fn isotope(mut self, isotope: impl Into<Expr>) -> Self {
        self.isotope = Some(isotope.into());
        self
    }

    pub fn abscissa(mut self, x: f64) -> Self {
        self.abscissa = Some(x);
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ComponentDecl {
    pub id: ComponentId,
    pub name: String,
    pub variable: bool,
}

/// Builder for constructing a reaction network incrementally.
///
/// Declare the isotope, components and reactions, then call `compile()` to
/// validate everything and freeze it into an immutable `Network`.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    isotopes: Vec<String>,
    components: Vec<ComponentDecl>,
    reactions: Vec<ReactionDef>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_isotope(&mut self, name: impl Into<String>) {
        self.isotopes.push(name.into());
    }

    /// Add a component and return its ID.
    pub fn add_component(&mut self, name: impl Into<String>, variable: bool) -> ComponentId {
        let id = ComponentId::from_index(self.components.len() as u32);
        self.components.push(ComponentDecl {
            id,
            name: name.into(),
            variable,
        });
        id
    }

    /// Externally buffered pool.
    pub fn add_fixed(&mut self, name: impl Into<String>) -> ComponentId {
        self.add_component(name, false)
    }

    /// Pool evolved by the ODE system.
    pub fn add_variable(&mut self, name: impl Into<String>) -> ComponentId {
        self.add_component(name, true)
    }

    pub fn add_reaction(&mut self, reaction: ReactionDef) -> ReactionId {
        let id = ReactionId::from_index(self.reactions.len() as u32);
        self.reactions.push(reaction);
        id
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Validate the declarations and compile the ODE system.
    pub fn compile(self) -> NetworkResult<Network> {
        let isotope = validate::validate_isotopes(&self.isotopes)?;
        let components = validate::validate_components(&self.components)?;
        let mut symbols = SymbolTable::new(&components, &isotope);

        let reactions = self
            .reactions
            .into_iter()
            .enumerate()
            .map(|(i, def)| {
                validate::validate_reaction(ReactionId::from_index(i as u32), def, &symbols)
            })
            .collect::<NetworkResult<Vec<_>>>()?;
        validate::validate_labels(&reactions)?;

        symbols.register(&reactions)?;
        let ode = OdeSystem::build(&isotope, &components, &reactions, &symbols)?;

        Ok(Network::new(isotope, components, reactions, symbols, ode))
    }
}
