//! Project -> compiled network.

use iso_network::{EndpointDef as Endpoint, Expr, Network, NetworkBuilder, ReactionDef as Reaction};

use crate::schema::{EndpointDef, PoolKind, Project, ReactionDef, WeightDef};
use crate::validate::validate_project;
use crate::ProjectResult;

/// Validate the project and compile its network.
pub fn build_network(project: &Project) -> ProjectResult<Network> {
    validate_project(project)?;

    let mut builder = NetworkBuilder::new();
    builder.add_isotope(project.isotope.clone());
    for component in &project.components {
        builder.add_component(component.name.clone(), component.kind == PoolKind::Variable);
    }
    for reaction in &project.reactions {
        builder.add_reaction(reaction_def(reaction)?);
    }
    Ok(builder.compile()?)
}

fn reaction_def(def: &ReactionDef) -> ProjectResult<Reaction> {
    let mut reaction = Reaction::new(def.label.clone(), Expr::parse(&def.flux)?);
    for endpoint in &def.from {
        reaction = reaction.from_endpoint(endpoint_def(endpoint)?);
    }
    for endpoint in &def.to {
        reaction = reaction.to_endpoint(endpoint_def(endpoint)?);
    }
    if let Some(isotope) = &def.isotope {
        reaction = reaction.isotope(Expr::parse(isotope)?);
    }
    if let Some(x) = def.abscissa {
        reaction = reaction.abscissa(x);
    }
    Ok(reaction)
}

fn endpoint_def(def: &EndpointDef) -> ProjectResult<Endpoint> {
    Ok(match def {
        EndpointDef::Name(name) => Endpoint::new(name.clone()),
        EndpointDef::Detailed {
            component,
            weight,
            isotope,
        } => {
            let mut endpoint = Endpoint::new(component.clone());
            match weight {
                Some(WeightDef::Value(w)) => endpoint = endpoint.weight(Expr::c(*w)),
                Some(WeightDef::Formula(f)) => endpoint = endpoint.weight(Expr::parse(f)?),
                None => {}
            }
            if let Some(isotope) = isotope {
                endpoint = endpoint.isotope(Expr::parse(isotope)?);
            }
            endpoint
        }
    })
}
