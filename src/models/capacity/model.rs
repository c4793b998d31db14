use std::collections::BTreeMap;

use log::info;

use super::constraints::ConstraintGenerator;
use super::objective;
use super::sets_and_parameters::{Parameters, Sets};
use super::variables::Variables;
use super::Scenario;
use crate::config::ModelConfig;
use crate::error::Error;
use crate::models::lp::LinearProgram;
use crate::models::utils::ConvertVars;
use crate::problem::{CategoryId, HandlerId, PeriodId, ProductId, ScenarioId, TesterId};
use crate::solver::{Solution, Solver, Status};
use crate::utils::EPSILON;

/// A built capacity planning model: the linear program and the variables it was built from.
#[derive(Debug)]
pub struct CapacityModel {
    pub lp: LinearProgram,
    pub vars: Variables,
    pub scenarios: Vec<Scenario>,
}

/// The decisions of a solved model
#[derive(Debug, Clone)]
pub struct Plan {
    pub status: Status,
    pub objective: f64,
    /// Terminal capital per scenario
    pub capital: BTreeMap<ScenarioId, f64>,
    /// Testers held at the end of the horizon
    pub testers: BTreeMap<TesterId, f64>,
    /// Handlers held at the end of the horizon
    pub handlers: BTreeMap<(CategoryId, HandlerId), f64>,
    pub production: BTreeMap<(ScenarioId, PeriodId, TesterId, ProductId), f64>,
    pub solution: Solution,
}

impl CapacityModel {
    /// Builds the deterministic model, or the scenario based one when the
    /// configuration asks for it.
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        config: &ModelConfig,
    ) -> Result<CapacityModel, Error> {
        config.validate()?;
        parameters.ensure_complete(sets)?;

        let scenarios = match &config.stochastic {
            Some(scenario_config) => Scenario::sample(scenario_config, parameters, sets)?,
            None => vec![Scenario::nominal(parameters)],
        };
        CapacityModel::with_scenarios(sets, parameters, config, scenarios)
    }

    /// Builds the model over the given scenarios. Stock is here-and-now when the
    /// configuration is stochastic.
    pub fn with_scenarios(
        sets: &Sets,
        parameters: &Parameters,
        config: &ModelConfig,
        scenarios: Vec<Scenario>,
    ) -> Result<CapacityModel, Error> {
        let name = match config.is_stochastic() {
            true => "stochastic_capacity_planning",
            false => "capacity_planning",
        };
        info!("Building {} model.", name);

        let mut lp = LinearProgram::new(name);

        //*****************CREATE VARIABLES*****************//
        let vars = Variables::new(&mut lp, sets, parameters, &scenarios, config)?;

        //*****************ADD CONSTRAINTS*****************//
        ConstraintGenerator {
            sets,
            parameters,
            scenarios: &scenarios,
            vars: &vars,
            config,
        }
        .generate(&mut lp)?;

        //*****************SET OBJECTIVE*****************//
        objective::set_objective(&mut lp, sets, parameters, &scenarios, &vars)?;

        Ok(CapacityModel {
            lp,
            vars,
            scenarios,
        })
    }

    pub fn solve(&self, solver: &dyn Solver, sets: &Sets) -> Result<Plan, Error> {
        let solution = solver.solve(&self.lp)?;
        info!(
            "{} finished: {}, objective {}",
            solver.name(),
            solution.status,
            solution.objective
        );

        let last = sets.last_period();
        let capital = self
            .scenarios
            .iter()
            .map(|s| Ok((s.id, self.vars.F.get((s.id, last))?.convert(&solution)?)))
            .collect::<Result<_, Error>>()?;

        Ok(Plan {
            status: solution.status.clone(),
            objective: solution.objective,
            capital,
            testers: self.vars.K.convert_terminal(sets, &sets.M, &solution)?,
            handlers: self
                .vars
                .KH
                .convert_terminal(sets, &sets.handler_pairs(), &solution)?,
            production: self.vars.Q.convert(&solution)?,
            solution,
        })
    }

    /// Variable names and values, leaving out zeros unless `all` is set
    pub fn named_values(&self, solution: &Solution, all: bool) -> Vec<(String, f64)> {
        self.lp
            .vars()
            .filter_map(|(var, def)| {
                let value = solution.value(var)?;
                match all || value.abs() > EPSILON {
                    true => Some((def.name.clone(), value)),
                    false => None,
                }
            })
            .collect()
    }

    /// Names of the constraints and bounds the solution violates
    pub fn violations(&self, solution: &Solution) -> Vec<String> {
        self.lp.violations(solution.values(), EPSILON)
    }
}
