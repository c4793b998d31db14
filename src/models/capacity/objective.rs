use log::debug;

use super::variables::Variables;
use super::{Parameters, Scenario, Sets};
use crate::error::Error;
use crate::models::lp::{Expression, LinearProgram, ObjSense};

/// The factor terminal capital is divided by to express it in initial money
pub fn discount(sets: &Sets, parameters: &Parameters) -> Result<f64, Error> {
    let rates = parameters.interest_rate.get()?;
    sets.P
        .iter()
        .map(|&p| rates.get(p).map(|r| 1.0 + r))
        .product()
}

/// Expected discounted terminal capital, less what the equipment bought beyond the
/// initial inventory loses between purchase and salvage.
pub fn objective(
    sets: &Sets,
    parameters: &Parameters,
    scenarios: &[Scenario],
    vars: &Variables,
) -> Result<Expression, Error> {
    let discount = discount(sets, parameters)?;
    let last = sets.last_period();
    debug!("discounting terminal capital by {}", discount);

    let capital = scenarios
        .iter()
        .map(|scenario| Ok(vars.F.get((scenario.id, last))? * (scenario.probability / discount)))
        .sum::<Result<Expression, Error>>()?;

    let initial_testers = parameters.initial_testers.get()?;
    let testers = sets
        .M
        .iter()
        .map(|&m| {
            let loss = parameters.tester_initial_price.get(m)?
                - parameters.tester_salvage_price.get(m)?;
            Ok((vars.K.terminal(sets, m)? - initial_testers.get(m)?) * loss)
        })
        .sum::<Result<Expression, Error>>()?;

    let initial_handlers = parameters.initial_handlers.get()?;
    let handlers = sets
        .handler_pairs()
        .into_iter()
        .map(|ha| {
            let loss = parameters.handler_initial_price.get(ha)?
                - parameters.handler_salvage_price.get(ha)?;
            Ok((vars.KH.terminal(sets, ha)? - initial_handlers.get(ha)?) * loss)
        })
        .sum::<Result<Expression, Error>>()?;

    Ok(capital - testers - handlers)
}

pub fn set_objective(
    lp: &mut LinearProgram,
    sets: &Sets,
    parameters: &Parameters,
    scenarios: &[Scenario],
    vars: &Variables,
) -> Result<(), Error> {
    let expr = objective(sets, parameters, scenarios, vars)?;
    lp.set_objective(expr, ObjSense::Maximize);
    Ok(())
}
