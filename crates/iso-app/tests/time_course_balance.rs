//! Balances along a full methanol time course.

use iso_app::{compile_project, methanol_project};
use iso_network::EvalContext;
use iso_params::{ScenarioDef, ScenarioTable};
use iso_sim::run;

#[test]
fn anabolism_conserves_delta_along_the_time_course() {
    let compiled = compile_project(&methanol_project()).unwrap();
    let table = ScenarioTable::new().with_scenario(
        ScenarioDef::new("base")
            .set("eps_lipid", -4.0)
            .set("f_lip_ac", 0.3),
    );
    let binding = compiled.binding.rebind(&compiled.network, &table).unwrap();
    let scenario = binding.get("base").unwrap();
    let network = &compiled.network;

    let trajectory = run(network, scenario, 2000).unwrap();
    assert_eq!(trajectory.len(), 2001);
    let inventory = trajectory.carbon_inventory(&trajectory.points[0]);
    assert!(trajectory.mass_balance_error() <= 1e-9 * inventory.max(1.0));

    let anabolism = network.reaction_by_label("anabolism").unwrap().id;
    for point in &trajectory.points {
        let ctx = EvalContext {
            params: scenario.params(),
            mass: &point.mass,
            delta: &point.delta,
        };
        let eval = network.evaluate_reaction(anabolism, &ctx).unwrap();
        let source = eval.source_delta().unwrap();
        let destination = eval.destination_delta().unwrap();
        assert!(
            (destination - source).abs() < 1e-9,
            "t = {}: {destination} vs {source}",
            point.time
        );
    }
}
