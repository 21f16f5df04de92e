//! Built-in methanol methanogenesis network.
//!
//! Same content as `projects/methanol.yaml`.

use iso_network::Network;
use iso_params::{ScenarioDef, ScenarioTable};
use iso_project::{ComponentDef, EndpointDef, PoolKind, Project, ReactionDef, WeightDef};

use crate::error::AppResult;

const VARIABLE_POOLS: [&str; 6] = ["CH3X", "CH4", "CO2", "AcCoA", "lipid", "biomass"];
const SINKS: [&str; 4] = ["CH4_out", "CO2_out", "lipid_out", "biomass_out"];
const OFFSETS: [&str; 6] = [
    "eps_uptake",
    "eps_CH4",
    "eps_CO2",
    "eps_methyl",
    "eps_carbonyl",
    "eps_lipid",
];

fn component(name: &str, kind: PoolKind, description: Option<&str>) -> ComponentDef {
    ComponentDef {
        name: name.to_string(),
        kind,
        description: description.map(str::to_string),
    }
}

fn names(names: &[&str]) -> Vec<EndpointDef> {
    names.iter().map(|n| EndpointDef::Name(n.to_string())).collect()
}

fn detailed(component: &str, weight: WeightDef, isotope: Option<&str>) -> EndpointDef {
    EndpointDef::Detailed {
        component: component.to_string(),
        weight: Some(weight),
        isotope: isotope.map(str::to_string),
    }
}

fn reaction(
    label: &str,
    flux: &str,
    from: Vec<EndpointDef>,
    to: Vec<EndpointDef>,
    isotope: Option<&str>,
    abscissa: f64,
) -> ReactionDef {
    ReactionDef {
        label: label.to_string(),
        flux: flux.to_string(),
        from,
        to,
        isotope: isotope.map(str::to_string),
        abscissa: Some(abscissa),
    }
}

fn scenarios() -> ScenarioTable {
    let mut table = ScenarioTable::new();
    for eps in OFFSETS {
        table = table.with_default(eps, 0.0);
    }
    table = table.with_default("f_lip_ac", 0.5);
    for pool in VARIABLE_POOLS {
        table = table
            .with_default(pool, 10.0)
            .with_default(format!("{pool}.C"), 0.0);
    }
    for sink in SINKS {
        table = table.with_default(format!("{sink}.C"), 0.0);
    }

    table
        .with_scenario(
            ScenarioDef::new("base")
                .set("net", 0.1)
                .set("f_CH4", 0.1)
                .set("f_CO2", 0.8)
                .set("f_lipid", 0.1)
                .set("eps_CH4", -83.5)
                .set("MeOH.C", -46.2),
        )
        .with_scenario(
            ScenarioDef::new("high_co2")
                .base("base")
                .set("f_CH4", 0.05)
                .set("f_CO2", 0.85),
        )
}

/// The methanol network with its `base` and `high_co2` scenarios.
pub fn methanol_project() -> Project {
    use PoolKind::{Fixed, Variable};

    let components = vec![
        component("MeOH", Fixed, Some("Methanol substrate")),
        component("CH3X", Variable, Some("Methyl intermediate")),
        component("CH4", Variable, None),
        component("CO2", Variable, None),
        component("AcCoA", Variable, Some("Acetyl-CoA")),
        component("lipid", Variable, None),
        component("biomass", Variable, Some("Non-lipid biomass")),
        component("CH4_out", Fixed, None),
        component("CO2_out", Fixed, None),
        component("lipid_out", Fixed, None),
        component("biomass_out", Fixed, None),
    ];

    let reactions = vec![
        reaction(
            "uptake",
            "net",
            names(&["MeOH"]),
            names(&["CH3X"]),
            Some("MeOH.C + eps_uptake"),
            0.0,
        ),
        reaction(
            "methanogenesis",
            "net * f_CH4",
            names(&["CH3X"]),
            names(&["CH4"]),
            Some("CH3X.C + eps_CH4"),
            1.0,
        ),
        reaction(
            "oxidation",
            "net * f_CO2",
            names(&["CH3X"]),
            names(&["CO2"]),
            Some("CH3X.C + eps_CO2"),
            1.0,
        ),
        reaction(
            "carbonylation",
            "2 * net * f_lipid",
            vec![
                detailed("CH3X", WeightDef::Value(0.5), Some("CH3X.C + eps_methyl")),
                detailed("CO2", WeightDef::Value(0.5), Some("CO2.C + eps_carbonyl")),
            ],
            names(&["AcCoA"]),
            None,
            2.0,
        ),
        reaction(
            "CO2_export",
            "net * f_CO2 - net * f_lipid",
            names(&["CO2"]),
            names(&["CO2_out"]),
            None,
            2.0,
        ),
        reaction(
            "anabolism",
            "2 * net * f_lipid",
            names(&["AcCoA"]),
            vec![
                detailed(
                    "lipid",
                    WeightDef::Formula("f_lip_ac".to_string()),
                    Some("AcCoA.C + eps_lipid"),
                ),
                detailed(
                    "biomass",
                    WeightDef::Formula("1 - f_lip_ac".to_string()),
                    Some("AcCoA.C - eps_lipid * f_lip_ac / (1 - f_lip_ac)"),
                ),
            ],
            None,
            3.0,
        ),
        reaction(
            "CH4_export",
            "net * f_CH4",
            names(&["CH4"]),
            names(&["CH4_out"]),
            None,
            2.0,
        ),
        reaction(
            "lipid_export",
            "2 * net * f_lipid * f_lip_ac",
            names(&["lipid"]),
            names(&["lipid_out"]),
            None,
            4.0,
        ),
        reaction(
            "biomass_export",
            "2 * net * f_lipid * (1 - f_lip_ac)",
            names(&["biomass"]),
            names(&["biomass_out"]),
            None,
            4.0,
        ),
    ];

    Project {
        version: 1,
        name: "Methanogenesis from methanol".to_string(),
        isotope: "C".to_string(),
        components,
        reactions,
        scenarios: scenarios(),
    }
}

/// Compiled methanol network.
pub fn methanol_network() -> AppResult<Network> {
    Ok(iso_project::build_network(&methanol_project())?)
}
