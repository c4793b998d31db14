#![allow(dead_code)]

use capacity_planning::repository::{self, Table};
use capacity_planning::{Error, Parameters, Repository, ScalarConfig, Sets};

/// Scalar text of the test instance
pub const OTHERS: &str = "Ip 0.01
Cep,t = Rp,t * 0.1
Csp,t = Rp,t * 0.5
yp,m=yp,a= 1.0
K0m = {0}
K0a = {0}
F0 = 1000
S0 = {0}
wp,m 10
";

/// One tester, one handler, one channel and one product, with a period per entry of `demands`.
/// A tester or handler serves 10 units of production per period.
pub fn tables(demands: &[f64]) -> Vec<(&'static str, String)> {
    let periods = 1..=demands.len();
    let per_period = |header: &str, row: &dyn Fn(usize) -> String| {
        let mut text = format!("{}\n", header);
        for p in periods.clone() {
            text.push_str(&row(p));
            text.push('\n');
        }
        text
    };

    vec![
        (repository::HANDLER_INITIAL_PRICE, "h,a,initial_price\n1,1,50\n".to_string()),
        (
            repository::HANDLER_BORROW_PRICE,
            per_period("p,h,a,z,price", &|p| format!("{},1,1,1,2", p)),
        ),
        (repository::HANDLER_ABILITY, "m,h,a,t,ability\n1,1,1,1,1\n".to_string()),
        (repository::HANDLER_SALVAGE_PRICE, "h,a,salvage_price\n1,1,10\n".to_string()),
        (repository::HANDLER_THROUGHPUT, "m,h,a,t,throughput\n1,1,1,1,1\n".to_string()),
        (repository::TESTER_INITIAL_PRICE, "m,initial_price\n1,100\n".to_string()),
        (
            repository::TESTER_BORROW_PRICE,
            per_period("p,m,z,price", &|p| format!("{},1,1,5", p)),
        ),
        (repository::TESTER_ABILITY, "m,t,ability\n1,1,1\n".to_string()),
        (repository::TESTER_SALVAGE_PRICE, "m,salvage_price\n1,20\n".to_string()),
        (repository::TESTER_THROUGHPUT, "m,t,throughput\n1,1,1\n".to_string()),
        (
            repository::PRODUCT_PROFIT,
            per_period("p,t,profit", &|p| format!("{},1,10", p)),
        ),
        (
            repository::DEMANDS,
            per_period("p,t,demand", &|p| format!("{},1,{}", p, demands[p - 1])),
        ),
    ]
}

pub fn repository(demands: &[f64]) -> Repository {
    let tables = tables(demands)
        .into_iter()
        .map(|(name, text)| Table::from_reader(name, text.as_bytes()).unwrap());
    Repository::from_tables(tables).unwrap()
}

pub fn try_instance(demands: &[f64], others: &str) -> Result<(Sets, Parameters), Error> {
    let repo = repository(demands);
    let scalars = ScalarConfig::extract(others)?;
    let sets = Sets::new(&repo)?;
    let parameters = Parameters::new(&repo, &scalars, &sets)?;
    Ok((sets, parameters))
}

pub fn instance(demands: &[f64]) -> (Sets, Parameters) {
    try_instance(demands, OTHERS).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        capacity_planning::utils::approx_eq(actual, expected),
        "expected {}, got {}",
        expected,
        actual
    );
}
