//! Project validation logic.
//!
//! Checks what can be checked on the file alone: names, references, formula
//! syntax and scenario bases. Routing and symbol rules are enforced when the
//! network is compiled.

use std::collections::HashSet;

use iso_network::Expr;

use crate::schema::{EndpointDef, Project, ReactionDef, WeightDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    if project.isotope.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "isotope".to_string(),
            value: project.isotope.clone(),
            reason: "must not be empty".to_string(),
        });
    }

    let mut component_names = HashSet::new();
    for component in &project.components {
        if !component_names.insert(component.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: component.name.clone(),
                context: "components".to_string(),
            });
        }
    }

    let mut labels = HashSet::new();
    for reaction in &project.reactions {
        if !labels.insert(reaction.label.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: reaction.label.clone(),
                context: "reactions".to_string(),
            });
        }
        validate_reaction(reaction, &component_names)?;
    }

    let mut scenario_names = HashSet::new();
    for scenario in &project.scenarios.scenarios {
        if !scenario_names.insert(scenario.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: scenario.name.clone(),
                context: "scenarios".to_string(),
            });
        }
    }
    for scenario in &project.scenarios.scenarios {
        if let Some(base) = &scenario.base {
            if !scenario_names.contains(base.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: base.clone(),
                    context: format!("scenario '{}' base", scenario.name),
                });
            }
        }
    }

    Ok(())
}

fn validate_reaction(
    reaction: &ReactionDef,
    component_names: &HashSet<&str>,
) -> Result<(), ValidationError> {
    check_formula(&format!("reaction '{}' flux", reaction.label), &reaction.flux)?;
    if let Some(isotope) = &reaction.isotope {
        check_formula(&format!("reaction '{}' isotope", reaction.label), isotope)?;
    }

    for (side, endpoints) in [("from", &reaction.from), ("to", &reaction.to)] {
        for endpoint in endpoints {
            let context = format!("reaction '{}' {side}", reaction.label);
            if !component_names.contains(endpoint.component()) {
                return Err(ValidationError::MissingReference {
                    id: endpoint.component().to_string(),
                    context,
                });
            }
            if let EndpointDef::Detailed {
                weight, isotope, ..
            } = endpoint
            {
                match weight {
                    Some(WeightDef::Formula(f)) => check_formula(&context, f)?,
                    Some(WeightDef::Value(w)) if !(w.is_finite() && *w > 0.0) => {
                        return Err(ValidationError::InvalidValue {
                            field: format!("{context} weight"),
                            value: w.to_string(),
                            reason: "must be positive".to_string(),
                        });
                    }
                    _ => {}
                }
                if let Some(isotope) = isotope {
                    check_formula(&context, isotope)?;
                }
            }
        }
    }
    Ok(())
}

fn check_formula(context: &str, formula: &str) -> Result<(), ValidationError> {
    Expr::parse(formula)
        .map(|_| ())
        .map_err(|err| ValidationError::InvalidValue {
            field: context.to_string(),
            value: formula.to_string(),
            reason: err.to_string(),
        })
}
