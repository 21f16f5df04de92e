//! Time-course integration against closed-form solutions.

use iso_network::{Expr, Network, NetworkBuilder, ReactionDef};
use iso_params::{BoundScenario, ScenarioDef, ScenarioTable, bind};
use iso_sim::{
    IntegratorType, SimError, StepSize, TimeCourseOptions, run, run_time_course,
    shortest_turnover,
};
use proptest::prelude::*;

/// MeOH (fixed) -> CH4 -> CH4_out (fixed), first-order export.
fn chain(uptake: &str) -> Network {
    let mut b = NetworkBuilder::new();
    b.add_isotope("C");
    b.add_fixed("MeOH");
    b.add_variable("CH4");
    b.add_fixed("CH4_out");
    b.add_reaction(
        ReactionDef::new("methanogenesis", uptake.parse::<Expr>().unwrap())
            .from("MeOH")
            .to("CH4")
            .isotope("MeOH.C + eps".parse::<Expr>().unwrap()),
    );
    b.add_reaction(
        ReactionDef::new("export", "k * CH4".parse::<Expr>().unwrap())
            .from("CH4")
            .to("CH4_out"),
    );
    b.compile().unwrap()
}

fn scenario(network: &Network, values: &[(&str, f64)]) -> BoundScenario {
    let mut def = ScenarioDef::new("s")
        .set("eps", -80.0)
        .set("MeOH.C", -46.2)
        .set("CH4.C", 0.0)
        .set("CH4_out.C", 0.0);
    for (k, v) in values {
        def = def.set(*k, *v);
    }
    bind(network, &ScenarioTable::new().with_scenario(def))
        .unwrap()
        .scenarios()[0]
        .clone()
}

#[test]
fn pool_size_relaxes_exponentially() {
    let net = chain("net");
    let s = scenario(&net, &[("net", 0.1), ("k", 0.05), ("CH4", 1.0)]);
    let opts = TimeCourseOptions {
        step_count: 400,
        step: StepSize::Fixed(0.1),
        ..TimeCourseOptions::default()
    };
    let traj = run_time_course(&net, &s, &opts).unwrap();
    assert_eq!(traj.len(), 401);

    let last = traj.last().unwrap();
    assert!((last.time - 40.0).abs() < 1e-9);
    // M(t) = net/k + (M0 - net/k) e^{-kt}
    let exact = 2.0 + (1.0 - 2.0) * (-0.05_f64 * 40.0).exp();
    assert!((last.mass[1] - exact).abs() < 1e-8);
    assert_eq!(last.mass[0], 0.0);
    assert_eq!(last.delta[0], -46.2);
}

#[test]
fn delta_relaxes_toward_product_of_source() {
    let net = chain("net");
    // pool already at steady size net/k
    let s = scenario(&net, &[("net", 0.1), ("k", 0.05), ("CH4", 2.0)]);
    let traj = run_time_course(
        &net,
        &s,
        &TimeCourseOptions {
            step_count: 200,
            step: StepSize::Fixed(0.5),
            ..TimeCourseOptions::default()
        },
    )
    .unwrap();
    let last = traj.last().unwrap();
    let target = -46.2 - 80.0;
    let exact = target + (0.0 - target) * (-0.05_f64 * 100.0).exp();
    assert!((last.delta[1] - exact).abs() < 1e-6);
}

#[test]
fn times_increase_from_zero_and_decimation_keeps_final_point() {
    let net = chain("net");
    let s = scenario(&net, &[("net", 0.1), ("k", 0.05), ("CH4", 1.0)]);
    let traj = run_time_course(
        &net,
        &s,
        &TimeCourseOptions {
            step_count: 25,
            step: StepSize::Fixed(1.0),
            integrator: IntegratorType::ForwardEuler,
            record_every: 10,
        },
    )
    .unwrap();
    assert_eq!(traj.times(), vec![0.0, 10.0, 20.0, 25.0]);
}

#[test]
fn auto_step_uses_turnover_time() {
    let net = chain("net");
    let s = scenario(&net, &[("net", 0.1), ("k", 0.05), ("CH4", 1.0)]);
    // turnover = M / (k M) = 20
    assert!((shortest_turnover(&net, &s.context()).unwrap() - 20.0).abs() < 1e-12);
    let traj = run(&net, &s, 10).unwrap();
    assert!((traj.points[1].time - 2.0).abs() < 1e-12);
}

#[test]
fn divergence_reports_partial_trajectory() {
    let net = chain("exp(a * CH4)");
    let s = scenario(&net, &[("a", 50.0), ("k", 0.05), ("CH4", 10.0)]);
    let err = run_time_course(
        &net,
        &s,
        &TimeCourseOptions {
            step_count: 10,
            step: StepSize::Fixed(0.01),
            ..TimeCourseOptions::default()
        },
    )
    .unwrap_err();
    match err {
        SimError::Integration {
            scenario,
            time,
            step,
            partial,
        } => {
            assert_eq!(scenario, "s");
            assert_eq!(step, 1);
            assert_eq!(time, 0.0);
            assert_eq!(partial.len(), 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn rejects_bad_options() {
    let net = chain("net");
    let s = scenario(&net, &[("net", 0.1), ("k", 0.05), ("CH4", 1.0)]);
    let bad_dt = TimeCourseOptions {
        step: StepSize::Fixed(0.0),
        ..TimeCourseOptions::default()
    };
    assert!(matches!(
        run_time_course(&net, &s, &bad_dt),
        Err(SimError::InvalidArg { .. })
    ));
    let bad_record = TimeCourseOptions {
        record_every: 0,
        ..TimeCourseOptions::default()
    };
    assert!(matches!(
        run_time_course(&net, &s, &bad_record),
        Err(SimError::InvalidArg { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn carbon_is_conserved(net_flux in 0.01_f64..1.0, k in 0.01_f64..0.5, m0 in 0.5_f64..20.0) {
        let net = chain("net");
        let s = scenario(&net, &[("net", net_flux), ("k", k), ("CH4", m0)]);
        let traj = run(&net, &s, 200).unwrap();
        prop_assert!(traj.mass_balance_error() <= 1e-9 * (1.0 + m0));
    }
}
