mod common;

use rstest::rstest;

use capacity_planning::models::capacity::ConstraintGenerator;
use capacity_planning::models::lp::Variable;
use capacity_planning::models::utils::ConvertVars;
use capacity_planning::problem::{
    CategoryId, ChannelId, HandlerId, Period, PeriodId, ProductId, ScenarioId, TesterId,
};
use capacity_planning::solver::{MicroLp, Status};
use capacity_planning::{BigM, CapacityModel, ModelConfig, Parameters, Plan, Sets};

use common::{assert_close, instance};

const S: ScenarioId = ScenarioId::NOMINAL;
const M1: TesterId = TesterId::new(1);
const H1: CategoryId = CategoryId::new(1);
const A1: HandlerId = HandlerId::new(1);
const Z1: ChannelId = ChannelId::new(1);
const T1: ProductId = ProductId::new(1);

fn p(id: u32) -> PeriodId {
    PeriodId::new(id)
}

fn solve(sets: &Sets, parameters: &Parameters, config: &ModelConfig) -> (CapacityModel, Plan) {
    let model = CapacityModel::build(sets, parameters, config).unwrap();
    let plan = model.solve(&MicroLp, sets).unwrap();
    (model, plan)
}

fn value(model: &CapacityModel, plan: &Plan, var: Variable) -> f64 {
    assert!(model.lp.var(var).is_some());
    var.convert(&plan.solution).unwrap()
}

/// The test instance with rentals too expensive to ever use
fn without_rentals(parameters: Parameters) -> Parameters {
    Parameters {
        tester_borrow_price: parameters.tester_borrow_price.scale("tester_borrow_price", 1e4),
        handler_borrow_price: parameters
            .handler_borrow_price
            .scale("handler_borrow_price", 1e4),
        ..parameters
    }
}

#[test]
fn acquires_capacity_in_the_period_with_demand() {
    let (sets, parameters) = instance(&[0.0, 25.0]);
    let (model, plan) = solve(&sets, &parameters, &ModelConfig::default());
    let vars = &model.vars;

    assert_eq!(plan.status, Status::Optimal);
    assert_close(plan.production[&(S, p(1), M1, T1)], 0.0);
    assert_close(plan.production[&(S, p(2), M1, T1)], 25.0);

    // renting is cheaper than buying for a single period
    assert_close(value(&model, &plan, vars.X.get((p(2), M1, Z1)).unwrap()), 3.0);
    assert_close(value(&model, &plan, vars.XH.get((p(2), H1, A1, Z1)).unwrap()), 3.0);
    assert_close(plan.testers[&M1], 0.0);
    assert_close(plan.handlers[&(H1, A1)], 0.0);

    for period in sets.horizon() {
        assert_close(value(&model, &plan, vars.S_neg.get((S, period, T1)).unwrap()), 0.0);
    }
    for &period in &sets.P {
        assert_close(value(&model, &plan, vars.V.get((S, period, T1)).unwrap()), 0.0);
    }

    // 1000 * 1.01 * 1.01 - 3 * 5 - 3 * 2 + 25 * 10 + 25 * 10
    assert_close(plan.capital[&S], 1499.1);
    assert_close(plan.objective, 1499.1 / (1.01 * 1.01));
}

#[rstest]
#[case::capped(true, 0.0, 15.0)]
#[case::uncapped(false, 10.0, 5.0)]
fn limited_capacity_leaves_shortage(
    #[case] demand_cap: bool,
    #[case] excess_first: f64,
    #[case] shortage_last: f64,
) {
    let (sets, parameters) = instance(&[0.0, 25.0]);
    let config = ModelConfig {
        demand_cap,
        acquisition_limit: Some(1),
        stock_limit: Some(0),
        ..ModelConfig::default()
    };
    let (model, plan) = solve(&sets, &parameters, &config);
    let vars = &model.vars;

    let first = (S, Period::Planning(p(1)), T1);
    let last = (S, Period::Planning(p(2)), T1);
    assert_close(value(&model, &plan, vars.S_pos.get(first).unwrap()), excess_first);
    assert_close(value(&model, &plan, vars.S_neg.get(last).unwrap()), shortage_last);
    assert_close(value(&model, &plan, vars.S_pos.get(last).unwrap()), 0.0);
    if excess_first > 0.0 {
        assert_close(value(&model, &plan, vars.y.get(first).unwrap()), 1.0);
    }
    assert_close(value(&model, &plan, vars.y.get(last).unwrap()), 0.0);

    assert_eq!(model.lp.constraint("demand_cap_(0,1,1)").is_some(), demand_cap);
    assert!(model.violations(&plan.solution).is_empty());
}

#[rstest]
#[case(&[0.0, 25.0])]
#[case(&[12.0, 3.0, 30.0])]
#[case(&[40.0, 0.0, 5.0, 18.0])]
fn solutions_satisfy_the_model_equations(#[case] demands: &[f64]) {
    let (sets, parameters) = instance(demands);
    let (model, plan) = solve(&sets, &parameters, &ModelConfig::default());
    let vars = &model.vars;
    let v = |var| value(&model, &plan, var);

    assert!(model.violations(&plan.solution).is_empty());

    let rate = 0.01;
    let mut capital = 1000.0;
    assert_close(v(vars.F.get((S, Period::Initial)).unwrap()), capital);
    assert_close(v(vars.S.get((S, Period::Initial, T1)).unwrap()), 0.0);
    assert_close(v(vars.K.available(Period::Initial, M1).unwrap()), 0.0);

    for (prev, period) in sets.transitions() {
        let here = Period::Planning(period);
        let demand = demands[period.get() as usize - 1];
        let q = v(vars.Q.get((S, period, M1, T1)).unwrap());

        // every unit of production goes through the single handler
        assert_close(v(vars.QH.get((S, period, M1, H1, A1, T1)).unwrap()), q);

        let loading = v(vars.S.get((S, here, T1)).unwrap());
        let before = v(vars.S.get((S, prev, T1)).unwrap());
        assert_close(loading, before + q - demand);

        let (pos, neg) = (
            v(vars.S_pos.get((S, here, T1)).unwrap()),
            v(vars.S_neg.get((S, here, T1)).unwrap()),
        );
        assert_close(loading, pos - neg);
        assert!(pos.min(neg) < 1e-6, "both loading parts are positive in {}", period);
        assert!(q <= demand + 1e-6);

        let cost = v(vars.V.get((S, period, T1)).unwrap());
        assert_close(cost, 1.0 * pos + 5.0 * neg);

        let x = v(vars.X.get((period, M1, Z1)).unwrap());
        let xh = v(vars.XH.get((period, H1, A1, Z1)).unwrap());
        capital = (1.0 + rate) * capital - 5.0 * x - 2.0 * xh - cost + 10.0 * demand + 10.0 * q;
        assert_close(v(vars.F.get((S, here)).unwrap()), capital);

        let stock = v(vars.K.available(here, M1).unwrap());
        assert!(stock + 1e-6 >= v(vars.K.available(prev, M1).unwrap()));
        assert!((stock + x) * 10.0 + 1e-6 >= q);
    }
    assert_close(plan.capital[&S], capital);
}

#[test]
fn fixed_big_m_gives_the_same_plan() {
    let (sets, parameters) = instance(&[10.0, 0.0, 30.0]);
    let (_, derived) = solve(&sets, &parameters, &ModelConfig::default());

    let config = ModelConfig {
        big_m: BigM::Fixed { value: 1000.0 },
        ..ModelConfig::default()
    };
    let (_, fixed) = solve(&sets, &parameters, &config);
    assert_close(fixed.objective, derived.objective);
}

#[test]
fn deterministic_model_names_the_nominal_scenario() {
    let (sets, parameters) = instance(&[0.0, 25.0]);
    let (model, plan) = solve(&sets, &parameters, &ModelConfig::default());

    assert_eq!(model.lp.name(), "capacity_planning");
    assert_eq!(model.scenarios.len(), 1);
    assert!(model.lp.constraint("capital_(0,2)").is_some());
    assert!(model.lp.constraint("tester_stock_(2,1)").is_some());
    assert!(model.lp.constraint("loading_balance_(0,1,1)").is_some());

    let nonzero = model.named_values(&plan.solution, false);
    assert!(nonzero
        .iter()
        .any(|(name, value)| name == "Q_(0,2,1,1)" && (value - 25.0).abs() < 1e-6));
    assert!(nonzero.iter().all(|(_, value)| value.abs() > 1e-6));
    assert_eq!(model.named_values(&plan.solution, true).len(), model.lp.num_vars());
}

#[test]
fn expensive_rentals_are_not_used() {
    let (sets, parameters) = instance(&[0.0, 25.0]);
    let parameters = without_rentals(parameters);
    let config = ModelConfig {
        stock_limit: Some(0),
        ..ModelConfig::default()
    };
    let (model, plan) = solve(&sets, &parameters, &config);

    assert_close(plan.production[&(S, p(2), M1, T1)], 0.0);
    let shortage = model.vars.S_neg.get((S, Period::Planning(p(2)), T1)).unwrap();
    assert_close(value(&model, &plan, shortage), 25.0);
}

#[test]
fn negative_demand_does_not_tighten_the_shortage_bound() {
    let (sets, parameters) = instance(&[10.0, -10.0]);
    let parameters = without_rentals(parameters);
    let config = ModelConfig {
        demand_cap: false,
        acquisition_limit: Some(5),
        stock_limit: Some(0),
        ..ModelConfig::default()
    };
    let (model, derived) = solve(&sets, &parameters, &config);

    // the returned demand of the second period can not offset the first period's shortfall
    let bounds = ConstraintGenerator {
        sets: &sets,
        parameters: &parameters,
        scenarios: &model.scenarios,
        vars: &model.vars,
        config: &config,
    }
    .big_m(&model.scenarios[0], T1)
    .unwrap();
    assert_close(bounds.neg, 11.0);

    let shortage = model.vars.S_neg.get((S, Period::Planning(p(1)), T1)).unwrap();
    assert_close(value(&model, &derived, shortage), 10.0);
    assert_close(derived.production[&(S, p(1), M1, T1)], 0.0);

    // 1000 * 1.01 - 5 * 10 + 10 * 10, then 1060 * 1.01 - 10 * 10
    assert_close(derived.capital[&S], 970.6);

    let fixed = ModelConfig {
        big_m: BigM::Fixed { value: 1000.0 },
        ..config
    };
    let (_, fixed) = solve(&sets, &parameters, &fixed);
    assert_close(fixed.objective, derived.objective);
}
