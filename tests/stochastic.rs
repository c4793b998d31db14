mod common;

use good_lp::IntoAffineExpression;
use rstest::rstest;

use capacity_planning::models::capacity::{
    objective, Distribution, Scenario, ScenarioConfig, Stock,
};
use capacity_planning::models::lp::Variable;
use capacity_planning::models::utils::ConvertVars;
use capacity_planning::problem::{
    CategoryId, ChannelId, HandlerId, Period, PeriodId, ProductId, TesterId,
};
use capacity_planning::solver::MicroLp;
use capacity_planning::{CapacityModel, ModelConfig};

use common::{assert_close, instance, try_instance, OTHERS};

fn scenarios(count: usize, distribution: Distribution, variance: f64, seed: u64) -> ScenarioConfig {
    ScenarioConfig {
        count,
        distribution,
        variance,
        seed: Some(seed),
    }
}

#[test]
fn stock_is_decided_once_for_every_scenario() {
    let others = OTHERS.replace("K0m = {0}", "K0m = {2}");
    let (sets, parameters) = try_instance(&[10.0, 25.0], &others).unwrap();
    let config = ModelConfig {
        stochastic: Some(scenarios(3, Distribution::Uniform, 0.1, 7)),
        ..ModelConfig::default()
    };

    let model = CapacityModel::build(&sets, &parameters, &config).unwrap();
    assert_eq!(model.lp.name(), "stochastic_capacity_planning");
    assert_eq!(model.scenarios.len(), 3);
    assert!(matches!(model.vars.K, Stock::HereAndNow(_)));
    assert_eq!(model.vars.K.len(), sets.M.len());
    assert_eq!(model.vars.KH.len(), sets.handler_pairs().len());
    assert!(model.lp.constraint("tester_stock_initial_(1)").is_none());

    let total: f64 = model.scenarios.iter().map(|s| s.probability).sum();
    assert_close(total, 1.0);

    let plan = model.solve(&MicroLp, &sets).unwrap();
    assert!(model.violations(&plan.solution).is_empty());
    assert_eq!(plan.capital.len(), 3);

    let m = TesterId::new(1);
    let ha = (CategoryId::new(1), HandlerId::new(1));
    let testers = plan.testers[&m];
    let handlers = plan.handlers[&ha];
    assert!(testers >= 2.0 - 1e-6);

    // the stock variable is shared, so every period sees the same value
    let k = model.vars.K.available(Period::Initial, m).unwrap();
    let k_last = model.vars.K.available(sets.last_period(), m).unwrap();
    assert_eq!(k, k_last);

    let discount = objective::discount(&sets, &parameters).unwrap();
    let expected = model
        .scenarios
        .iter()
        .map(|s| s.probability * plan.capital[&s.id] / discount)
        .sum::<f64>()
        - 80.0 * (testers - 2.0)
        - 40.0 * handlers;
    assert_close(plan.objective, expected);

    for scenario in &model.scenarios {
        for &p in &sets.P {
            let q = model
                .vars
                .Q
                .get((scenario.id, p, m, ProductId::new(1)))
                .unwrap()
                .convert(&plan.solution)
                .unwrap();
            let cap = scenario.demand_mto.get((p, ProductId::new(1))).unwrap();
            assert!(q <= cap + 1e-6);
        }
    }
}

#[test]
fn acquisitions_are_shared_by_every_scenario() {
    let (sets, parameters) = instance(&[10.0, 25.0]);
    let config = ModelConfig {
        stochastic: Some(scenarios(4, Distribution::Normal, 0.3, 5)),
        ..ModelConfig::default()
    };
    let model = CapacityModel::build(&sets, &parameters, &config).unwrap();
    let vars = &model.vars;

    assert_eq!(vars.X.len(), sets.P.len() * sets.M.len() * sets.Z.len());
    assert_eq!(
        vars.XH.len(),
        sets.P.len() * sets.handler_pairs().len() * sets.Zh.len()
    );
    assert_eq!(vars.Q.len(), 4 * sets.P.len() * sets.M.len() * sets.T.len());

    let (p, z) = (PeriodId::new(2), ChannelId::new(1));
    let x = vars.X.get((p, TesterId::new(1), z)).unwrap();
    let xh = vars.XH.get((p, CategoryId::new(1), HandlerId::new(1), z)).unwrap();
    for scenario in &model.scenarios {
        let name = format!("capital_({},{})", scenario.id, p);
        let capital = model.lp.constraint(&name).unwrap();
        let uses = |var: Variable| {
            IntoAffineExpression::linear_coefficients(&capital.expr)
                .any(|(v, coef)| v == var && coef != 0.0)
        };
        assert!(uses(x), "{} does not pay for X", name);
        assert!(uses(xh), "{} does not pay for XH", name);

        let capacity = format!("tester_capacity_({},{},1)", scenario.id, p);
        assert!(model.lp.constraint(&capacity).is_some());
    }

    let plan = model.solve(&MicroLp, &sets).unwrap();
    assert!(model.violations(&plan.solution).is_empty());
}

#[test]
fn sampling_is_reproducible_per_seed() {
    let (sets, parameters) = instance(&[10.0, 25.0, 5.0]);
    let draw = |seed| {
        Scenario::sample(&scenarios(4, Distribution::Normal, 0.2, seed), &parameters, &sets)
            .unwrap()
    };

    let first = draw(11);
    let again = draw(11);
    let other = draw(12);
    for (a, b) in first.iter().zip(&again) {
        assert_eq!(a.demand_mts, b.demand_mts);
    }
    assert!(first.iter().zip(&other).any(|(a, b)| a.demand_mts != b.demand_mts));
}

#[rstest]
#[case(Distribution::Uniform, 0.3)]
#[case(Distribution::Normal, 4.0)]
fn sampled_demand_is_non_negative(#[case] distribution: Distribution, #[case] variance: f64) {
    let (sets, parameters) = instance(&[10.0, 25.0, 5.0, 0.0]);
    let sampled =
        Scenario::sample(&scenarios(20, distribution, variance, 3), &parameters, &sets).unwrap();

    assert_eq!(sampled.len(), 20);
    for scenario in &sampled {
        assert_close(scenario.probability, 0.05);
        assert_eq!(scenario.demand_mts.len(), 4);
        for ((key, mts), (_, mto)) in scenario.demand_mts.iter().zip(scenario.demand_mto.iter()) {
            assert!(mts >= 0.0, "negative demand {} at {:?}", mts, key);
            assert_close(mts, mto);
        }
        // zero demand stays zero under any factor
        assert_eq!(scenario.demand_mts.get((PeriodId::new(4), ProductId::new(1))).unwrap(), 0.0);
    }
}

#[test]
fn zero_variance_reproduces_nominal_demand() {
    let (sets, parameters) = instance(&[10.0, 25.0]);
    let config = scenarios(2, Distribution::Uniform, 0.0, 1);
    let sampled = Scenario::sample(&config, &parameters, &sets).unwrap();
    for scenario in sampled {
        assert_eq!(scenario.demand_mts, parameters.demand_mts);
    }
}

#[test]
fn invalid_scenario_count_is_a_config_error() {
    let (sets, parameters) = instance(&[10.0]);
    let config = ModelConfig {
        stochastic: Some(scenarios(0, Distribution::Uniform, 0.1, 1)),
        ..ModelConfig::default()
    };
    let err = CapacityModel::build(&sets, &parameters, &config).unwrap_err();
    assert_eq!(err.kind(), capacity_planning::ErrorKind::Config);
}
